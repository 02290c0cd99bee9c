//! Utils - Common Utilities for CLI Commands
//!
//! Shared output formatting and file-size helpers used across commands.
//!
//! @version 0.1.0
//! @author OnnxForge Development Team

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

static QUIET: AtomicBool = AtomicBool::new(false);
static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Suppress informational output (errors still go to stderr).
pub fn set_quiet(quiet: bool) {
    QUIET.store(quiet, Ordering::Relaxed);
}

fn is_quiet() -> bool {
    QUIET.load(Ordering::Relaxed)
}

/// Enable extra diagnostic output.
pub fn set_verbose(verbose: bool) {
    VERBOSE.store(verbose, Ordering::Relaxed);
}

/// Returns true when verbose output is on and not muted by quiet.
pub fn verbose_enabled() -> bool {
    VERBOSE.load(Ordering::Relaxed) && !is_quiet()
}

// =============================================================================
// Output Formatting
// =============================================================================

/// Print a success message
pub fn print_success(message: &str) {
    if !is_quiet() {
        println!("{} {}", "✓".green().bold(), message);
    }
}

/// Print an info message
pub fn print_info(message: &str) {
    if !is_quiet() {
        println!("{} {}", "ℹ".blue().bold(), message);
    }
}

/// Print a warning message
pub fn print_warning(message: &str) {
    if !is_quiet() {
        println!("{} {}", "⚠".yellow().bold(), message);
    }
}

/// Print a step in a multi-step process
pub fn print_step(step: usize, total: usize, message: &str) {
    if !is_quiet() {
        println!("{} {}", format!("[{step}/{total}]").cyan().bold(), message);
    }
}

/// Print a key-value pair
pub fn print_kv(key: &str, value: &str) {
    if !is_quiet() {
        println!("  {}: {}", key.dimmed(), value);
    }
}

/// Print a detail line only shown with --verbose
pub fn print_verbose(message: &str) {
    if verbose_enabled() {
        println!("  {}", message.dimmed());
    }
}

// =============================================================================
// Progress Bars
// =============================================================================

/// Create a spinner for indeterminate operations
pub fn spinner(message: &str) -> ProgressBar {
    if is_quiet() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(message.to_string());
    pb
}

// =============================================================================
// File Sizes
// =============================================================================

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// File size in mebibytes.
pub fn file_size_mb<P: AsRef<Path>>(path: P) -> std::io::Result<f64> {
    let len = std::fs::metadata(path)?.len();
    Ok(len as f64 / BYTES_PER_MB)
}

/// Format a mebibyte size with two decimals, e.g. "12.34 MB".
pub fn format_mb(size_mb: f64) -> String {
    format!("{size_mb:.2} MB")
}

/// Size reduction in percent relative to the original size.
pub fn size_reduction_percent(original_mb: f64, output_mb: f64) -> f64 {
    if original_mb <= 0.0 {
        return 0.0;
    }
    (original_mb - output_mb) / original_mb * 100.0
}

/// Format a percentage with two decimals, matching the size format.
pub fn format_percent(percent: f64) -> String {
    format!("{percent:.2}%")
}

/// Print the original/output size comparison for a finished command.
pub fn print_size_report(original_mb: f64, output_mb: f64) {
    print_kv("Original size", &format_mb(original_mb));
    print_kv("Output size", &format_mb(output_mb));
    print_kv(
        "Size reduction",
        &format_percent(size_reduction_percent(original_mb, output_mb)),
    );
}

// =============================================================================
// Tests
// =============================================================================
