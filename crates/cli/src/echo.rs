use std::time::Duration;

use owo_colors::OwoColorize;
use sectio_core::MobileSections;

use crate::VERSION;

/// Print a styled banner for verbose mode
pub fn print_banner() {
    eprintln!(
        "\n{} {} {}",
        "Sectio".bold().bright_blue(),
        "v".dimmed(),
        VERSION.dimmed()
    );
    eprintln!("{}", "Render wiki articles as mobile-sections JSON\n".dimmed());
}

/// Print a styled step message
pub fn print_step(step: usize, total: usize, message: &str) {
    eprintln!("{} {}", format!("[{}/{}]", step, total).dimmed(), message.bright_cyan());
}

/// Print a success message
pub fn print_success(message: &str) {
    eprintln!("{} {}", "✓".green(), message.bright_green());
}

/// Print an info message
pub fn print_info(message: &str) {
    eprintln!("{} {}", "ℹ".blue(), message.bright_blue());
}

/// Print a warning message
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow(), message.bright_yellow());
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message.bright_red());
}

/// Print a labelled value
pub fn print_field(label: &str, value: &str) {
    eprintln!("  {} {}", format!("{}:", label).dimmed(), value.bright_white());
}

/// Print timing information with color coding
pub fn print_timing(label: &str, duration: Duration) {
    let ms = duration.as_secs_f64() * 1000.0;
    let label = format!("{}:", label);

    if ms < 50.0 {
        eprintln!("  {} {:>8.2}ms ({})", label.dimmed(), ms, "fast".dimmed());
    } else if ms < 250.0 {
        eprintln!("  {} {:>8.2}ms ({})", label.dimmed(), ms, "moderate".bright_yellow());
    } else {
        eprintln!("  {} {:>8.2}ms ({})", label.dimmed(), ms, "slow".bright_red());
    }
}

/// Print a section outline of a full response
pub fn print_outline(response: &MobileSections) {
    eprintln!("\n{}", "═".repeat(60).dimmed());
    eprintln!("{}", "Sections".bold().cyan());
    eprintln!("{}", "═".repeat(60).dimmed());

    for section in &response.remaining.sections {
        let indent = "  ".repeat(section.toclevel.unwrap_or(1) as usize);
        let line = section.line.as_deref().unwrap_or_default();
        if section.is_reference_section == Some(true) {
            eprintln!(
                "{}{} {} {}",
                indent,
                section.id.to_string().dimmed(),
                line.bright_white(),
                "(references)".dimmed()
            );
        } else {
            eprintln!("{}{} {}", indent, section.id.to_string().dimmed(), line.bright_white());
        }
    }
    eprintln!();
}

/// Format file size for display
pub fn format_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = 1024 * KB;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
