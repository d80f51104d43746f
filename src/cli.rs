use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "regress",
    version,
    about = "Generate and verify simulator trace baselines"
)]
pub struct Cli {
    #[arg(
        short,
        long,
        global = true,
        help = "Config file (defaults to ./regress.toml when present)"
    )]
    pub config: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        help = "Regression root holding traces/, knowns/ and the archives"
    )]
    pub root: Option<PathBuf>,
    #[arg(short, long, global = true, action = ArgAction::Count, help = "More output (-v info, -vv debug)")]
    pub verbose: u8,
    #[arg(long, global = true, help = "Output machine-readable JSON")]
    pub json: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the simulator and store its trace as the new baseline
    Generate {
        /// Tests to run (all configured tests when omitted)
        tests: Vec<String>,
    },
    /// Run the simulator and compare its trace against the baseline
    Verify {
        /// Tests to run (all configured tests when omitted)
        tests: Vec<String>,
    },
    /// List configured tests and whether each has a baseline
    List,
    /// List the files stored in a test's baseline archive
    Show { test: String },
    /// Print an example config file
    ExampleConfig,
}
