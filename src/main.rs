use std::io::IsTerminal;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use regress::cli::{Cli, Commands};
use regress::config::EXAMPLE_CONFIG;
use regress::runner::EXIT_ERROR;
use regress::util::absolutize;
use regress::{BaselineArchive, Config, Mode, RegressError, RegressionRunner};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(code) => ExitCode::from(code as u8),
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(EXIT_ERROR as u8)
        }
    }
}

/// Log to stderr; RUST_LOG wins over -v
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<i32> {
    match &cli.command {
        Commands::Generate { tests } => run_tests(load_config(&cli)?, tests, Mode::Generate, &cli),
        Commands::Verify { tests } => run_tests(load_config(&cli)?, tests, Mode::Verify, &cli),
        Commands::List => list_tests(&load_config(&cli)?, cli.json),
        Commands::Show { test } => show_baseline(&load_config(&cli)?, test, cli.json),
        Commands::ExampleConfig => {
            print!("{}", EXAMPLE_CONFIG);
            Ok(0)
        }
    }
}

/// Load the config file and apply `--root`
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(root) = &cli.root {
        config.set_root(absolutize(root)?);
    }
    Ok(config)
}

fn run_tests(config: Config, names: &[String], mode: Mode, cli: &Cli) -> Result<i32> {
    let tests = config.select_tests(names)?;
    let runner = RegressionRunner::new(config).context("Failed to set up simulator")?;

    let report = runner.run_suite(&tests, mode);
    if cli.json {
        println!("{}", report.to_json());
    } else {
        report.print_summary(cli.verbose > 0);
    }
    Ok(report.exit_code())
}

fn list_tests(config: &Config, json: bool) -> Result<i32> {
    let rows: Vec<_> = config
        .tests
        .iter()
        .map(|test| {
            let archive = config.archive_path(&test.name);
            let has_baseline = archive.is_file();
            (test.name.as_str(), archive, has_baseline)
        })
        .collect();

    if json {
        let value: Vec<_> = rows
            .iter()
            .map(|(name, archive, has_baseline)| {
                serde_json::json!({
                    "test": name,
                    "archive": archive,
                    "has_baseline": has_baseline,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else if rows.is_empty() {
        println!("No tests configured");
    } else {
        for (name, archive, has_baseline) in &rows {
            let status = if *has_baseline { "baseline" } else { "no baseline" };
            println!("{:<32} {:<12} {}", name, status, archive.display());
        }
    }
    Ok(0)
}

fn show_baseline(config: &Config, test: &str, json: bool) -> Result<i32> {
    let test = config.test_case(test)?;
    let archive = config.archive_path(&test.name);
    if !archive.is_file() {
        return Err(RegressError::BaselineMissing {
            test: test.name,
            path: archive,
        }
        .into());
    }

    let entries = BaselineArchive::list(&archive)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        for entry in &entries {
            println!("{}", entry.display());
        }
    }
    Ok(0)
}
