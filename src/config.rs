//! Configuration handling for the scanner.

use crate::registry::npm;
use crate::types::{HttpConfig, Result, TypoguardError};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

/// npm typosquat and install-hook risk scanner.
#[derive(Parser, Debug, Clone)]
#[command(name = "typoguard")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the classification database (defaults to the user data dir)
    #[arg(long, env = "TYPOGUARD_DB", global = true)]
    pub db: Option<PathBuf>,

    /// Registry metadata base URL
    #[arg(long, default_value = "https://registry.npmjs.org", global = true)]
    pub registry_url: String,

    /// Download statistics base URL
    #[arg(long, default_value = "https://api.npmjs.org", global = true)]
    pub api_url: String,

    /// Request timeout in seconds
    #[arg(long, default_value = "30", global = true)]
    pub timeout: u64,

    /// Maximum retries after upstream rate limiting
    #[arg(long, default_value = "3", global = true)]
    pub max_retries: u32,

    /// Rate limit (requests per second)
    #[arg(long, default_value = "10", global = true)]
    pub rate_limit: u32,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Vet a package, then run `npm install` for it after confirmation
    Install(ActionArgs),
    /// Vet a package, then run `npm update` for it after confirmation
    Update(ActionArgs),
    /// Classify and score a package name without installing anything
    Check(CheckArgs),
    /// Statically scan a package's lifecycle install hooks
    ScanHooks(CheckArgs),
    /// Seed the legitimate set from package names (args and/or --file)
    Populate(PopulateArgs),
    /// Generate and classify typosquat candidates for the legitimate set
    Classify(ClassifyArgs),
    /// Print partition counts and low-volume typosquat download sums
    Stats(StatsArgs),
}

/// Arguments for the install and update commands.
#[derive(Parser, Debug, Clone)]
pub struct ActionArgs {
    /// Package name to vet
    pub package: String,

    /// Skip the interactive confirmation
    #[arg(short = 'y', long)]
    pub yes: bool,
}

/// Arguments for the check and scan-hooks commands.
#[derive(Parser, Debug, Clone)]
pub struct CheckArgs {
    /// Package name to vet
    pub package: String,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the populate command.
#[derive(Parser, Debug, Clone)]
pub struct PopulateArgs {
    /// Package names to seed
    #[arg(required_unless_present = "file")]
    pub names: Vec<String>,

    /// File containing package names (one per line, # for comments)
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Re-probe names already present and update them in place
    #[arg(long)]
    pub refresh: bool,

    /// After seeding, drop entries with weekly downloads below this floor
    #[arg(long)]
    pub prune_weekly_floor: Option<u64>,

    /// After seeding, drop entries with monthly downloads below this floor
    #[arg(long)]
    pub prune_monthly_floor: Option<u64>,
}

/// Arguments for the classify command.
#[derive(Parser, Debug, Clone)]
pub struct ClassifyArgs {
    /// Names per existence batch
    #[arg(long, default_value = "128")]
    pub batch_size: usize,

    /// Seconds to pause between successive batches
    #[arg(long, default_value = "1")]
    pub batch_pause: u64,
}

/// Arguments for the stats command.
#[derive(Parser, Debug, Clone)]
pub struct StatsArgs {
    /// Weekly downloads below this count toward the weekly sum
    #[arg(long, default_value = "1000")]
    pub weekly_limit: u64,

    /// Monthly downloads below this count toward the monthly sum
    #[arg(long, default_value = "1000")]
    pub monthly_limit: u64,
}

impl Config {
    /// Fail fast on operator mistakes before any I/O happens.
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.registry_url)?;
        url::Url::parse(&self.api_url)?;
        if self.rate_limit == 0 {
            return Err(TypoguardError::ConfigError(
                "rate limit must be at least 1 request per second".to_string(),
            ));
        }
        if let Commands::Classify(ref args) = self.command {
            if args.batch_size == 0 || args.batch_size > npm::MAX_BATCH {
                return Err(TypoguardError::ConfigError(format!(
                    "batch size must be between 1 and {}",
                    npm::MAX_BATCH
                )));
            }
        }
        Ok(())
    }

    /// Get HTTP configuration for the registry probe.
    pub fn http_config(&self) -> HttpConfig {
        HttpConfig {
            timeout_secs: self.timeout,
            max_retries: self.max_retries,
            ..HttpConfig::default()
        }
    }

    /// Resolve the database path: explicit flag, then the platform data
    /// directory, then the working directory.
    pub fn db_path(&self) -> PathBuf {
        if let Some(ref db) = self.db {
            return db.clone();
        }
        dirs::data_dir()
            .map(|dir| dir.join("typoguard").join("typoguard.db"))
            .unwrap_or_else(|| PathBuf::from("typoguard.db"))
    }
}

impl ClassifyArgs {
    pub fn pause(&self) -> Duration {
        Duration::from_secs(self.batch_pause)
    }
}

impl PopulateArgs {
    /// Collect seed names from the positional arguments and the optional
    /// file, preserving order.
    pub fn load_names(&self) -> Result<Vec<String>> {
        let mut names = self.names.clone();

        if let Some(ref file_path) = self.file {
            let content = std::fs::read_to_string(file_path)?;
            for line in content.lines() {
                let trimmed = line.trim();
                if !trimmed.is_empty() && !trimmed.starts_with('#') {
                    names.push(trimmed.to_string());
                }
            }
        }

        if names.is_empty() {
            return Err(TypoguardError::ConfigError(
                "no package names given".to_string(),
            ));
        }
        Ok(names)
    }
}
