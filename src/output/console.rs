//! Console output utilities.

use console::style;

/// Print an info message.
pub fn print_info(message: &str) {
    println!("{} {}", style("INFO").cyan().bold(), message);
}

/// Print a success message.
pub fn print_success(message: &str) {
    println!("{} {}", style("OK").green().bold(), message);
}

/// Print a warning message.
pub fn print_warning(message: &str) {
    println!("{} {}", style("WARN").yellow().bold(), message);
}

/// Print an error message.
pub fn print_error(message: &str) {
    eprintln!("{} {}", style("ERROR").red().bold(), message);
}

/// Print the application banner.
pub fn print_banner() {
    let banner = r#"
╔═══════════════════════════════════════════════════════╗
║     Pinterest Downloader                              ║
║     Original-quality media from pins and profiles     ║
╚═══════════════════════════════════════════════════════╝
"#;
    println!("{}", style(banner).red());
}

/// Print the run's inputs and settings.
pub fn print_run_summary(inputs: usize, download_dir: &str, quality: &str, story_pins: &str) {
    println!();
    println!("{}", style("Run:").bold());
    println!("  Links:      {}", inputs);
    println!("  Directory:  {}", download_dir);
    println!("  Quality:    {}", quality);
    println!("  Story pins: {}", story_pins);
    println!();
}
