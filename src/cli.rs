use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "edclub-enricher")]
#[command(about = "Enriches tenant subdomains with school names, domain liveness, and web-archive history")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Create default configuration file at ./config/edclub-enricher.toml
    #[arg(long, global = true)]
    pub init: bool,

    /// Path to configuration file (defaults to ./config/edclub-enricher.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<String>,

    /// Verbose logging (use -v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Import a subdomain source list into the record store
    ///
    /// Creates an empty record for every subdomain not yet in the store;
    /// existing records are never touched.
    Import {
        /// Newline-delimited subdomain list (# comments and blanks ignored)
        #[arg(value_name = "FILE")]
        source: String,
    },

    /// Resolve school names for records that lack one
    Names {
        /// Render pages in a headless browser (for script-injected headings)
        #[arg(long)]
        browser: bool,
    },

    /// Probe both candidate hostnames for liveness
    Validate,

    /// Look up first/last archived snapshot dates
    Wayback,

    /// Run the long-lived enrichment worker against the remote store
    ///
    /// Requires SUPABASE_URL and SUPABASE_KEY in the environment. Never
    /// exits under normal operation.
    Worker,

    /// One-shot migration of the file store into the remote table
    ///
    /// Requires SUPABASE_URL and SUPABASE_KEY in the environment.
    Migrate,

    /// Print aggregate enrichment progress
    Stats {
        /// Read the remote stats view instead of the local store
        #[arg(long)]
        remote: bool,
    },
}
