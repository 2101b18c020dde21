use colored::Colorize;
use std::path::Path;

/// Summary of a request that changed (or would change) something
pub fn changed(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Summary of a request that was already satisfied
pub fn unchanged(msg: &str) {
    println!("{} {}", "=".dimmed(), msg.dimmed());
}

/// Query summary followed by one enabled name per line
pub fn listing(msg: &str, names: &[String]) {
    println!("{} {}", "ℹ".blue(), msg);
    for name in names {
        println!("  {name}");
    }
}

/// Non-fatal note attached to a report
pub fn warning(msg: &str) {
    eprintln!("{} {}", "⚠".yellow(), msg);
}

/// Failure summary
pub fn failure(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Captured output of the command behind a failure; blank streams are skipped
pub fn tool_stream(label: &str, text: &str) {
    if text.trim().is_empty() {
        return;
    }
    eprintln!("  {}", format!("{label}:").dimmed());
    eprintln!("{}", indented(text));
}

/// Advice line under a failure or doctor issue
pub fn advice(text: &str) -> String {
    format!("{} {}", "Fix:".cyan(), text)
}

/// Section title in doctor output
pub fn section(title: &str) {
    println!();
    println!("{}", title.cyan().bold());
}

/// Key/value line in doctor output
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Doctor line for one command of the table
pub fn tool_line(role: &str, path: &Path, runnable: bool) -> String {
    if runnable {
        format!("  {} {role} - {}", "✓".green(), path.display().to_string().dimmed())
    } else {
        format!("  {} {role} - {} {}", "✗".red(), path.display(), "(missing)".red())
    }
}

fn indented(text: &str) -> String {
    text.lines()
        .map(|line| format!("    {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indented() {
        assert_eq!(indented("a\nb\n"), "    a\n    b");
        assert_eq!(indented(""), "");
    }

    #[test]
    fn test_tool_line() {
        let path = Path::new("/usr/sbin/a2enmod");
        let ok = tool_line("module enable", path, true);
        assert!(ok.contains("module enable"));
        assert!(ok.contains("/usr/sbin/a2enmod"));
        assert!(!ok.contains("(missing)"));

        assert!(tool_line("query", Path::new("a2query"), false).contains("(missing)"));
    }

    #[test]
    fn test_advice() {
        assert!(advice("Install apache2").ends_with("Install apache2"));
    }
}
