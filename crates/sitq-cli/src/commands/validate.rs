use anyhow::{Result, bail};
use console::style;
use sitq_core::{Config, ConfigIssue, Severity};
use std::path::Path;

pub fn execute(path: &Path) -> Result<()> {
    let config = Config::from_file(path)?;
    let issues = config.check();

    print_report(path, &config, &issues);

    let errors = count(&issues, Severity::Error);
    if errors > 0 {
        bail!("{} has {} error(s)", path.display(), errors);
    }
    Ok(())
}

fn print_report(path: &Path, config: &Config, issues: &[ConfigIssue]) {
    println!(
        "\n{}",
        style(format!("Config: {}", path.display())).bold().cyan()
    );

    println!("  Login URL:    {}", config.login_url());
    println!(
        "  Monitor URL:  {}",
        config.monitor_url().unwrap_or("(not set)")
    );
    println!(
        "  Booking URL:  {}",
        config.booking_url().unwrap_or("(stay on monitor page)")
    );
    println!("  Fill fields:  {}", config.fill_fields().len());
    println!(
        "  Max attempts: {}",
        match config.max_attempts() {
            0 => "unbounded".to_string(),
            n => n.to_string(),
        }
    );

    if issues.is_empty() {
        println!("\n{}", style("No issues found").green().bold());
        return;
    }

    println!("\n{}", style("Issues:").bold());
    for issue in issues {
        let label = match issue.severity {
            Severity::Error => style("error").red().bold(),
            Severity::Warning => style("warning").yellow(),
        };
        println!(
            "  {} {} {}",
            label,
            style(issue.field).bold(),
            style(&issue.message).dim()
        );
    }

    println!(
        "\n{} error(s), {} warning(s)",
        count(issues, Severity::Error),
        count(issues, Severity::Warning)
    );
}

fn count(issues: &[ConfigIssue], severity: Severity) -> usize {
    issues.iter().filter(|i| i.severity == severity).count()
}
