//! typoguard - npm typosquat and install-hook risk scanner.
//!
//! CLI entry point.

use clap::Parser;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;
use typoguard::assess::Assessor;
use typoguard::config::{ActionArgs, CheckArgs, ClassifyArgs, PopulateArgs, StatsArgs};
use typoguard::hooks::{HookScanner, NpmCli};
use typoguard::notify::ConsoleOutput;
use typoguard::populate;
use typoguard::registry::NpmProbe;
use typoguard::{Assessment, Classifier, Commands, Config, Store};

/// Exit code when vetting blocks the action: absent package, no registry
/// data, or the user declined.
const EXIT_BLOCKED: u8 = 2;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let config = Config::parse();

    // Set up logging
    let filter = if config.verbose {
        EnvFilter::new("typoguard=debug,info")
    } else {
        EnvFilter::new("typoguard=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    if let Err(e) = config.validate() {
        error!("{}", e);
        return ExitCode::FAILURE;
    }

    let result = match config.command.clone() {
        Commands::Install(args) => run_action("install", &args, &config).await,
        Commands::Update(args) => run_action("update", &args, &config).await,
        Commands::Check(args) => run_check(&args, &config).await,
        Commands::ScanHooks(args) => run_scan_hooks(&args, &config).await,
        Commands::Populate(args) => run_populate(&args, &config).await,
        Commands::Classify(args) => run_classify(&args, &config).await,
        Commands::Stats(args) => run_stats(&args, &config).await,
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn open_parts(config: &Config) -> typoguard::Result<(Store, NpmProbe)> {
    let store = Store::open(&config.db_path())?;
    let probe = NpmProbe::new(
        config.http_config(),
        config.rate_limit,
        config.registry_url.clone(),
        config.api_url.clone(),
    )?;
    Ok((store, probe))
}

/// Vet a package, then hand over to the real npm verb once the user (or
/// `--yes`) agrees. npm's own exit code is passed through.
async fn run_action(verb: &str, args: &ActionArgs, config: &Config) -> typoguard::Result<ExitCode> {
    let console = ConsoleOutput::new(config.verbose, false, false);
    print_banner();
    console.print_check_start(&args.package);

    let (store, probe) = open_parts(config)?;
    let assessor = Assessor::new(&store, &probe);
    let assessment = assessor.assess(&args.package).await?;
    console.print_assessment(&args.package, &assessment);

    match assessment {
        Assessment::Absent => {
            console.print_info("Aborting: the package does not exist.");
            return Ok(ExitCode::from(EXIT_BLOCKED));
        }
        Assessment::Unavailable => {
            console.print_info("Aborting: no registry data to judge the package.");
            return Ok(ExitCode::from(EXIT_BLOCKED));
        }
        _ => {}
    }

    console.print_progress("Inspecting install hooks...");
    let scanner = HookScanner::new(NpmCli::new())?;
    let hook_report = scanner.scan(&args.package).await?;
    console.print_hook_report(&hook_report);

    println!();
    if !args.yes {
        let question = format!("Proceed with npm {} {}?", verb, args.package);
        if !console.confirm(&question) {
            console.print_info("Aborted.");
            return Ok(ExitCode::from(EXIT_BLOCKED));
        }
    }

    let code = NpmCli::new().run_verb(verb, &args.package).await?;
    Ok(ExitCode::from(u8::try_from(code).unwrap_or(1)))
}

async fn run_check(args: &CheckArgs, config: &Config) -> typoguard::Result<ExitCode> {
    let console = ConsoleOutput::new(config.verbose, args.json, false);
    console.print_check_start(&args.package);

    let (store, probe) = open_parts(config)?;
    let assessment = Assessor::new(&store, &probe).assess(&args.package).await?;
    console.print_assessment(&args.package, &assessment);

    Ok(match assessment {
        Assessment::Absent | Assessment::Unavailable => ExitCode::from(EXIT_BLOCKED),
        _ => ExitCode::SUCCESS,
    })
}

async fn run_scan_hooks(args: &CheckArgs, config: &Config) -> typoguard::Result<ExitCode> {
    let console = ConsoleOutput::new(config.verbose, args.json, false);
    console.print_check_start(&args.package);

    let scanner = HookScanner::new(NpmCli::new())?;
    let report = scanner.scan(&args.package).await?;
    console.print_hook_report(&report);
    Ok(ExitCode::SUCCESS)
}

async fn run_populate(args: &PopulateArgs, config: &Config) -> typoguard::Result<ExitCode> {
    let names = args.load_names()?;
    let console = ConsoleOutput::new(config.verbose, false, false);
    let (store, probe) = open_parts(config)?;

    let mut report = populate::populate(&store, &probe, &names, args.refresh, &console).await?;

    if args.prune_weekly_floor.is_some() || args.prune_monthly_floor.is_some() {
        report.pruned = store.prune_legitimate(
            args.prune_weekly_floor.unwrap_or(u64::MAX),
            args.prune_monthly_floor.unwrap_or(u64::MAX),
        )?;
    }

    console.print_populate_report(&report);
    Ok(ExitCode::SUCCESS)
}

async fn run_classify(args: &ClassifyArgs, config: &Config) -> typoguard::Result<ExitCode> {
    let console = ConsoleOutput::new(config.verbose, false, false);
    let (store, probe) = open_parts(config)?;

    let classifier = Classifier::new(&store, &probe, &console, args.batch_size, args.pause());
    let report = classifier.run().await?;

    console.print_classify_report(&report);
    Ok(ExitCode::SUCCESS)
}

async fn run_stats(args: &StatsArgs, config: &Config) -> typoguard::Result<ExitCode> {
    let console = ConsoleOutput::new(config.verbose, false, false);
    let store = Store::open(&config.db_path())?;

    let counts = store.counts()?;
    let sums = store.typosquat_download_sums(args.weekly_limit, args.monthly_limit)?;
    console.print_stats(&counts, sums, (args.weekly_limit, args.monthly_limit));
    Ok(ExitCode::SUCCESS)
}

fn print_banner() {
    println!();
    println!("\x1b[36m╔══════════════════════════════════════════════════════════════╗\x1b[0m");
    println!("\x1b[36m║                    TYPOGUARD v0.1.0                          ║\x1b[0m");
    println!("\x1b[36m║        npm typosquat & install-hook vetting                  ║\x1b[0m");
    println!("\x1b[36m╚══════════════════════════════════════════════════════════════╝\x1b[0m");
    println!();
}
