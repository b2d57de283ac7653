use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "babytrack")]
#[command(about = "Track an infant's growth, feeding, sleep and milestones")]
pub struct Cli {
    /// Log scoring details to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Manage baby profiles
    Baby {
        #[command(subcommand)]
        action: BabyCommand,
    },

    /// Log, edit and browse daily progress records
    Progress {
        #[command(subcommand)]
        action: ProgressCommand,
    },

    /// Aggregated insights over a baby's records
    Insights {
        baby_id: i64,

        /// week, month or all (defaults to the configured timeframe)
        #[arg(long)]
        timeframe: Option<String>,

        /// Print the raw JSON summary
        #[arg(long)]
        json: bool,
    },

    /// Score a record without storing anything
    Score {
        /// JSON file with the baby profile
        baby: String,

        /// JSON file with the record, or "-" for stdin
        record: String,

        /// Evaluation time for open sleep sessions (RFC 3339, defaults to now)
        #[arg(long)]
        now: Option<String>,
    },

    /// Generate a markdown report and trend chart
    Report {
        baby_id: i64,

        /// week, month or all (defaults to the configured timeframe)
        #[arg(long)]
        timeframe: Option<String>,
    },

    /// Print the active reference tables as TOML
    Reference {
        /// Write to a file instead of stdout
        #[arg(long)]
        output: Option<String>,
    },

    /// Show where data and config files are stored
    Paths,
}

#[derive(Subcommand)]
pub enum BabyCommand {
    /// Add a baby
    Add {
        name: String,

        /// Date of birth (YYYY-MM-DD)
        #[arg(long)]
        born: String,

        /// "male" or "female"; anything else uses the male tables
        #[arg(long)]
        gender: Option<String>,
    },

    /// List all babies
    List,

    /// Show one baby
    Show { id: i64 },

    /// Change a baby's details and rescore all of its records
    Update {
        id: i64,

        #[arg(long)]
        name: Option<String>,

        /// Date of birth (YYYY-MM-DD)
        #[arg(long)]
        born: Option<String>,

        #[arg(long)]
        gender: Option<String>,
    },

    /// Delete a baby and all of its records
    Remove { id: i64 },
}

#[derive(Subcommand)]
pub enum ProgressCommand {
    /// Add a record from a JSON file ("-" reads stdin)
    Add { baby_id: i64, file: String },

    /// Apply a partial JSON update to a record and rescore it
    Update {
        baby_id: i64,
        record_id: i64,
        file: String,
    },

    /// List records, newest first
    List {
        baby_id: i64,

        /// Earliest date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// Latest date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,

        #[arg(long, default_value_t = 0)]
        skip: usize,

        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show one record as JSON
    Show { baby_id: i64, record_id: i64 },

    /// Delete a record
    Remove { baby_id: i64, record_id: i64 },
}
