use crate::filter::FilterCriterion;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Filter structured log records with validated, reorderable criteria
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Engine configuration file (TOML)
    #[arg(long, global = true, env = "LOG_FILTER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding saved filter configurations
    #[arg(long, global = true, env = "LOG_FILTER_STORE_DIR")]
    pub store_dir: Option<PathBuf>,

    /// Compare strings case-sensitively (default: case-insensitive)
    #[arg(long, global = true)]
    pub case_sensitive: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    /// One JSON record per line
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List filterable fields with their value kinds and operators
    Fields,

    /// List the operators available for one field
    Operators {
        /// Field name (e.g. "Level", "pid")
        field: String,
    },

    /// Validate criteria and report every error and warning
    Validate {
        /// Criterion as field:operator:value (repeatable)
        #[arg(short = 'c', long = "criterion", required = true)]
        criteria: Vec<FilterCriterion>,
    },

    /// Stream JSON-lines records through a filter
    Apply {
        /// Records file in JSON-lines format ("-" for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Criterion as field:operator:value (repeatable, combined with AND)
        #[arg(short = 'c', long = "criterion", required_unless_present = "saved")]
        criteria: Vec<FilterCriterion>,

        /// Use a saved filter configuration instead of --criterion
        #[arg(long, conflicts_with = "criteria")]
        saved: Option<String>,

        /// Output format
        #[arg(short = 'F', long, value_enum, default_value_t)]
        format: OutputFormat,

        /// Print the evaluation order and estimates to stderr
        #[arg(long)]
        explain: bool,
    },

    /// Manage saved filter configurations
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Validate and save criteria under a name
    Save {
        name: String,

        /// Criterion as field:operator:value (repeatable)
        #[arg(short = 'c', long = "criterion", required = true)]
        criteria: Vec<FilterCriterion>,
    },
    /// Print a saved configuration
    Show { name: String },
    /// List saved configuration names
    List,
    /// Delete a saved configuration
    Delete { name: String },
    /// Print a configuration as portable text
    Export {
        name: String,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Import and save a configuration from exported text
    Import {
        /// Exported configuration file ("-" for stdin)
        file: PathBuf,
    },
}

pub fn cli_parse() -> Cli {
    Cli::parse()
}
