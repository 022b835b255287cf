use colored::{ColoredString, Colorize};
use declarative::ActionKind;

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a section header
pub fn section(title: &str) {
    println!();
    println!("{}", title.cyan().bold());
}

/// Colored plan marker for an action kind
pub fn marker(kind: ActionKind) -> ColoredString {
    let symbol = kind.symbol();
    match kind {
        ActionKind::Create => symbol.green().bold(),
        ActionKind::Update => symbol.yellow().bold(),
        ActionKind::Noop => symbol.dimmed(),
        ActionKind::Warning => symbol.red().bold(),
    }
}

// ============================================================================
// Sizes
// ============================================================================

const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

/// Bytes in binary units, one decimal above 1 KB
pub fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

/// "used / max" for quota displays; max is omitted when unknown
pub fn format_usage(used: Option<u64>, max: Option<u64>) -> String {
    match (used, max) {
        (Some(used), Some(max)) if max > 0 => format!(
            "{} / {} ({:.0}%)",
            format_size(used),
            format_size(max),
            used as f64 * 100.0 / max as f64
        ),
        (Some(used), _) => format_size(used),
        (None, _) => "unknown".to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================
