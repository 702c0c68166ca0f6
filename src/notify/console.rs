//! Colored console output for scan results.

use crate::scoring;
use crate::types::{
    Assessment, ClassifyReport, HookBand, HookReport, PopulateReport, RiskBand, StoreCounts,
};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{BufRead, Write};

/// Console output handler with colors and formatting.
pub struct ConsoleOutput {
    verbose: bool,
    json_mode: bool,
    quiet: bool,
}

impl ConsoleOutput {
    /// Create a new console output handler.
    pub fn new(verbose: bool, json_mode: bool, quiet: bool) -> Self {
        Self { verbose, json_mode, quiet }
    }

    /// Print the name being vetted.
    pub fn print_check_start(&self, name: &str) {
        if self.json_mode || self.quiet {
            return;
        }

        println!(
            "{} Checking: {}",
            "[*]".bright_blue(),
            name.bright_white()
        );
    }

    /// Print progress (only in verbose mode).
    pub fn print_progress(&self, message: &str) {
        if self.json_mode || !self.verbose {
            return;
        }

        println!("{} {}", "[.]".dimmed(), message.dimmed());
    }

    /// Print info message.
    pub fn print_info(&self, message: &str) {
        if self.json_mode || self.quiet {
            return;
        }

        println!("{} {}", "[*]".bright_blue(), message);
    }

    /// Print the typosquat verdict for one name.
    pub fn print_assessment(&self, name: &str, assessment: &Assessment) {
        if self.json_mode {
            if let Ok(json) = serde_json::to_string_pretty(assessment) {
                println!("{}", json);
            }
            return;
        }

        println!();
        match assessment {
            Assessment::Legitimate { record } => {
                self.print_header(name, RiskBand::Legitimate);
                println!("    |-- Status: {}", "in the legitimate set".green());
                println!("    |-- Weekly downloads: {}", record.weekly_downloads);
                println!("    |-- Monthly downloads: {}", record.monthly_downloads);
                println!(
                    "    +-- Last update: {}",
                    record.last_update.format("%Y-%m-%d")
                );
            }
            Assessment::Typosquat { record, score, band } => {
                self.print_header(name, *band);
                println!(
                    "    |-- Status: {}",
                    format!("LIVE TYPOSQUAT of {}", record.typosquatted_from)
                        .red()
                        .bold()
                );
                println!("    |-- Detected via: {}", record.detection_method);
                println!("    |-- Weekly downloads: {}", record.weekly_downloads);
                println!("    |-- Monthly downloads: {}", record.monthly_downloads);
                println!(
                    "    |-- Last update: {}",
                    record.last_update.format("%Y-%m-%d")
                );
                self.print_score_line(*score, *band);
            }
            Assessment::Unknown { stats, score, band } => {
                self.print_header(name, *band);
                println!(
                    "    |-- Status: {}",
                    "not in the classification store".yellow()
                );
                println!("    |-- Weekly downloads: {}", stats.weekly_downloads);
                println!("    |-- Monthly downloads: {}", stats.monthly_downloads);
                println!(
                    "    |-- Last update: {}",
                    stats.last_update.format("%Y-%m-%d")
                );
                self.print_score_line(*score, *band);
            }
            Assessment::Absent => {
                println!(
                    "{} {} [{}]",
                    "===".bright_cyan(),
                    name.bright_white().bold(),
                    "NOT ON NPM".red().bold()
                );
                println!(
                    "    +-- Status: {}",
                    "does not exist on the registry".red()
                );
            }
            Assessment::Unavailable => {
                println!(
                    "{} {} [{}]",
                    "===".bright_cyan(),
                    name.bright_white().bold(),
                    "UNKNOWN".yellow().bold()
                );
                println!(
                    "    +-- Status: {}",
                    "registry gave no usable answer".yellow()
                );
            }
        }
    }

    fn print_header(&self, name: &str, band: RiskBand) {
        println!(
            "{} {} [{}]",
            "===".bright_cyan(),
            name.bright_white().bold(),
            format_band(band)
        );
    }

    fn print_score_line(&self, score: u32, band: RiskBand) {
        let line = format!("Risk score: {}/{}", score, scoring::MAX_SCORE);
        let colored = match band {
            RiskBand::Malicious => line.red().bold(),
            RiskBand::Suspicious => line.yellow(),
            RiskBand::Legitimate => line.green(),
        };
        println!("    +-- {}", colored);
    }

    /// Print the install-hook findings for one package.
    pub fn print_hook_report(&self, report: &HookReport) {
        if self.json_mode {
            if let Ok(json) = serde_json::to_string_pretty(report) {
                println!("{}", json);
            }
            return;
        }

        println!();
        println!(
            "{} {} install hooks [{}]",
            "===".bright_cyan(),
            report.package.bright_white().bold(),
            format_hook_band(report.band())
        );

        if report.scripts_found.is_empty() && report.findings.is_empty() {
            println!("    +-- {}", "no install hooks declared".green());
            return;
        }

        if !report.scripts_found.is_empty() {
            println!("    |-- Hooks declared: {}", report.scripts_found.join(", "));
        }
        for finding in &report.findings {
            println!(
                "    |-- {} {}: {}",
                format_severity(finding.severity),
                finding.hook,
                finding.description
            );
            if self.verbose {
                println!("    |       pattern: {}", finding.pattern.dimmed());
            }
        }
        println!("    +-- Hook risk score: {}", report.risk_score);
    }

    /// Print the summary of a classification run.
    pub fn print_classify_report(&self, report: &ClassifyReport) {
        if self.json_mode {
            if let Ok(json) = serde_json::to_string_pretty(report) {
                println!("{}", json);
            }
            return;
        }
        if self.quiet && report.confirmed_typosquats == 0 {
            return;
        }

        println!();
        println!("{}", "=== Classification Summary ===".bright_cyan());
        println!("  Candidates generated:  {}", report.generated);
        println!("  Already classified:    {}", report.already_classified);
        if report.confirmed_typosquats > 0 {
            println!(
                "  {}",
                format!("NEW LIVE TYPOSQUATS:   {}", report.confirmed_typosquats)
                    .red()
                    .bold()
            );
        } else {
            println!("  {}", "No new live typosquats found.".green());
        }
        println!("  Confirmed absent:      {}", report.confirmed_absent);
        println!("  Deferred (no data):    {}", report.deferred);
        if report.skipped_batches > 0 {
            println!(
                "  {}",
                format!("Skipped batches:       {}", report.skipped_batches).yellow()
            );
        }
    }

    /// Print the summary of a populate run.
    pub fn print_populate_report(&self, report: &PopulateReport) {
        if self.json_mode {
            if let Ok(json) = serde_json::to_string_pretty(report) {
                println!("{}", json);
            }
            return;
        }
        if self.quiet {
            return;
        }

        println!();
        println!("{}", "=== Populate Summary ===".bright_cyan());
        println!("  Seeded:      {}", report.seeded);
        println!("  Refreshed:   {}", report.refreshed);
        println!("  Skipped:     {}", report.skipped);
        if report.unavailable > 0 {
            println!(
                "  {}",
                format!("Unavailable: {}", report.unavailable).yellow()
            );
        }
        if report.pruned > 0 {
            println!("  Pruned:      {}", report.pruned);
        }
    }

    /// Print partition counts and the low-volume download sums.
    pub fn print_stats(
        &self,
        counts: &StoreCounts,
        sums: (u64, u64),
        limits: (u64, u64),
    ) {
        if self.json_mode {
            if let Ok(json) = serde_json::to_string_pretty(counts) {
                println!("{}", json);
            }
            return;
        }

        println!();
        println!("{}", "=== Classification Store ===".bright_cyan());
        println!("  Legitimate packages: {}", counts.legitimate);
        if counts.typosquats > 0 {
            println!(
                "  {}",
                format!("Known typosquats:    {}", counts.typosquats).red().bold()
            );
        } else {
            println!("  Known typosquats:    0");
        }
        println!("  Confirmed absent:    {}", counts.unresolved);
        println!();
        println!("  Typosquat downloads below thresholds:");
        println!("    weekly  (< {}): {}", limits.0, sums.0);
        println!("    monthly (< {}): {}", limits.1, sums.1);
    }

    /// Blocking y/n prompt. EOF or unreadable stdin counts as no.
    pub fn confirm(&self, question: &str) -> bool {
        loop {
            print!("{} {} (y/n): ", "[?]".bright_blue(), question);
            let _ = std::io::stdout().flush();

            let mut line = String::new();
            match std::io::stdin().lock().read_line(&mut line) {
                Ok(0) | Err(_) => return false,
                Ok(_) => {}
            }
            match line.trim().to_ascii_lowercase().as_str() {
                "y" | "yes" => return true,
                "n" | "no" => return false,
                _ => println!("{}", "Please answer y or n.".dimmed()),
            }
        }
    }

    /// Create a progress bar.
    pub fn create_progress_bar(&self, total: u64, message: &str) -> Option<ProgressBar> {
        if self.json_mode || self.quiet {
            return None;
        }

        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("#>-"),
        );
        pb.set_message(message.to_string());
        Some(pb)
    }
}

/// Format a verdict band with color.
fn format_band(band: RiskBand) -> colored::ColoredString {
    match band {
        RiskBand::Malicious => band.label().red().bold(),
        RiskBand::Suspicious => band.label().yellow().bold(),
        RiskBand::Legitimate => band.label().green(),
    }
}

/// Format an install-hook band with color.
fn format_hook_band(band: HookBand) -> colored::ColoredString {
    match band {
        HookBand::High => "HIGH".red().bold(),
        HookBand::Medium => "MEDIUM".yellow().bold(),
        HookBand::Low => "LOW".green(),
    }
}

/// Format a rule severity with color.
fn format_severity(severity: u32) -> colored::ColoredString {
    let label = format!("[{}]", severity);
    match severity {
        4..=5 => label.red().bold(),
        3 => label.yellow(),
        _ => label.blue(),
    }
}

impl Default for ConsoleOutput {
    fn default() -> Self {
        Self::new(false, false, false)
    }
}
