use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "esclient", version, about = "Command line client for Elasticsearch-compatible servers")]
pub struct Cli {
    /// Path to a JSON client config
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Server base URL, overrides the config file
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// Basic auth username; enables basic auth
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// Basic auth password
    #[arg(long, global = true, env = "ESCLIENT_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Also write JSON logs to this directory
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List index names
    Indices,

    /// Show field types of an index
    Mapping { index: String },

    /// Fetch one document
    Get { index: String, id: String },

    /// Search an index
    Search(SearchArgs),

    /// Count matching documents
    Count(QueryArgs),

    /// Count documents per distinct value of a field
    Aggregate { index: String, field: String },

    /// Store one JSON document read from a file
    Save(SaveArgs),

    /// Create documents from a file with one JSON document per line
    BulkCreate { index: String, file: PathBuf },

    /// Delete one document
    Delete { index: String, id: String },

    /// Delete every document in an index
    DeleteAll {
        index: String,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Args, Debug)]
pub struct QueryArgs {
    pub index: String,

    /// Field for a match query
    #[arg(long, requires = "value", conflicts_with = "query")]
    pub field: Option<String>,

    /// Value to match
    #[arg(long, requires = "field")]
    pub value: Option<String>,

    /// Query-string query
    #[arg(long)]
    pub query: Option<String>,
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    #[command(flatten)]
    pub query: QueryArgs,

    /// Maximum number of hits to return
    #[arg(long, default_value_t = esclient_rs::DEFAULT_MAX_HITS)]
    pub max_hits: u32,

    /// Print the raw server response
    #[arg(long)]
    pub raw: bool,
}

#[derive(Args, Debug)]
pub struct SaveArgs {
    pub index: String,
    pub file: PathBuf,

    /// Document id; the server assigns one when omitted
    #[arg(long)]
    pub id: Option<String>,

    /// Only write if the stored document has this sequence number
    #[arg(long, requires_all = ["id", "primary_term"])]
    pub seq_no: Option<u64>,

    /// Primary term paired with --seq-no
    #[arg(long, requires = "seq_no")]
    pub primary_term: Option<u64>,
}
