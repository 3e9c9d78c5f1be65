use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "ragstore",
    about = "In-memory vector store and retrieval service",
    version
)]
pub struct Cli {
    /// Enable verbose output
    #[arg(global = true, long, short)]
    pub verbose: bool,

    /// Base URL of a running service (default: $RAGSTORE_URL or http://127.0.0.1:3002)
    #[arg(global = true, long)]
    pub url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP service
    Serve {
        /// Interface to bind (default: $RAGSTORE_HOST or 127.0.0.1)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (default: $RAGSTORE_PORT or 3002)
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Run the JSON-RPC tool server on stdio
    Mcp,

    /// Index one piece of content on a running service
    Add {
        /// Text to index
        content: String,

        /// Record type (issue, sop, log, or a custom tag)
        #[arg(long = "type", short = 't')]
        record_type: String,

        /// Id of the originating entity
        #[arg(long)]
        source_id: String,

        /// Record id (defaults to a hash of the content)
        #[arg(long)]
        id: Option<String>,

        /// Extra metadata as key=value (repeatable; values parse as JSON when possible)
        #[arg(long = "meta", short = 'm')]
        meta: Vec<String>,
    },

    /// Search a running service
    Search {
        /// Free-text query
        query: String,

        /// Maximum number of results
        #[arg(short = 'k', long, default_value = "5")]
        top_k: usize,

        /// Only records of this type
        #[arg(long = "type", short = 't')]
        record_type: Option<String>,

        /// Only records from this entity
        #[arg(long)]
        source_id: Option<String>,
    },

    /// Fetch one record
    Get {
        /// Record id
        id: String,
    },

    /// Remove one record
    Delete {
        /// Record id
        id: String,
    },

    /// Remove every record on the service
    Clear {
        /// Confirm the purge
        #[arg(long)]
        yes: bool,
    },

    /// Show record counts and time range
    Stats,

    /// Embed text locally and summarize the vector
    Embed {
        /// Text to embed
        text: String,

        /// Print every component as JSON
        #[arg(long)]
        full: bool,
    },

    /// Run the text extractors over generated text (file or stdin)
    Extract {
        /// File to read (reads stdin when omitted)
        file: Option<std::path::PathBuf>,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,

        /// Build an SOP document instead of a resolution summary
        #[arg(long)]
        sop: bool,

        /// Title of the resolved issue (required with --sop)
        #[arg(long)]
        title: Option<String>,

        /// How the issue was resolved (required with --sop)
        #[arg(long)]
        resolution: Option<String>,

        /// Symptoms seen on the issue
        #[arg(long)]
        symptoms: Option<String>,

        /// Root cause of the issue
        #[arg(long)]
        root_cause: Option<String>,

        /// SOP category
        #[arg(long)]
        category: Option<String>,
    },
}
