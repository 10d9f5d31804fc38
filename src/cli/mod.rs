pub mod backup;
pub mod categorize;
pub mod clear;
pub mod credentials;
pub mod dashboard;
pub mod import;
pub mod init;
pub mod items;
pub mod periods;
pub mod rules;
pub mod serve;
pub mod status;
pub mod sync;

use clap::{Parser, Subcommand};
use rusqlite::Connection;

use crate::db;
use crate::error::Result;
use crate::settings::load_settings;

/// Open the configured database, applying pending migrations.
pub(crate) fn open_db() -> Result<Connection> {
    let settings = load_settings();
    std::fs::create_dir_all(&settings.data_dir)?;
    db::open(&settings.db_path())
}

#[derive(Parser)]
#[command(name = "finboard", about = "Open-banking sync, categorization and billing-cycle dashboard.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Choose a data directory and initialize the database.
    Init {
        /// Path for finboard data (default: ~/.local/share/finboard)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Serve the HTTP API.
    Serve {
        /// Address to listen on, e.g. 127.0.0.1:3001
        #[arg(long)]
        listen: Option<String>,
    },
    /// Fetch a provider connection and sync its accounts.
    Sync {
        /// Provider item id
        item_id: String,
        /// Credential id (default: the item's credential, or the only one stored)
        #[arg(long)]
        credential: Option<i64>,
    },
    /// Import a JSON array of transactions as manual entries.
    Import {
        /// Path to a JSON file: [{"date", "amount", "description", "type"}, ...]
        file: String,
        /// Account id the entries belong to
        #[arg(long)]
        account: String,
        /// Account type: BANK or CREDIT
        #[arg(long = "type", default_value = "BANK")]
        account_type: String,
        #[arg(long, default_value = "")]
        bank: String,
        #[arg(long, default_value = "")]
        owner: String,
    },
    /// Show balances, category totals and recent transactions.
    Dashboard {
        /// Period: YYYY-MM or all
        #[arg(long, default_value = "all")]
        period: String,
        /// Account type: BANK, CREDIT or all
        #[arg(long = "type", default_value = "all")]
        account_type: String,
        #[arg(long)]
        bank: Option<String>,
        #[arg(long)]
        owner: Option<String>,
        /// Number of transactions to list
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
    /// Set a transaction's category and learn a rule from its description.
    Categorize {
        /// Transaction id
        id: i64,
        /// Category name
        category: String,
    },
    /// Manage keyword rules.
    Rules {
        #[command(subcommand)]
        command: RulesCommands,
    },
    /// Manage provider credentials.
    Credentials {
        #[command(subcommand)]
        command: CredentialsCommands,
    },
    /// Manage saved provider connections.
    Items {
        #[command(subcommand)]
        command: ItemsCommands,
    },
    /// List selectable periods with their default billing cycle.
    Periods,
    /// Delete every stored transaction.
    Clear {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
    /// Show database location and row counts.
    Status,
    /// Back up the database.
    Backup {
        /// Output path (default: <data_dir>/backups/finboard-v<schema>-YYYYMMDD-HHMMSS.db)
        #[arg(long)]
        output: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum RulesCommands {
    /// Add or replace a keyword rule.
    Add {
        /// Keyword matched against descriptions (case-insensitive)
        keyword: String,
        #[arg(long)]
        category: String,
    },
    /// List all rules.
    List,
    /// Delete a rule by keyword.
    Delete { keyword: String },
}

#[derive(Subcommand)]
pub enum CredentialsCommands {
    /// Store a client id; the secret is prompted for.
    Add {
        name: String,
        #[arg(long = "client-id")]
        client_id: String,
    },
    /// List credentials (secrets are never shown).
    List,
    /// Delete a credential.
    Delete { id: i64 },
}

#[derive(Subcommand)]
pub enum ItemsCommands {
    /// Save a provider connection with the identity its accounts belong to.
    Add {
        item_id: String,
        #[arg(long)]
        bank: String,
        #[arg(long)]
        owner: String,
        #[arg(long)]
        credential: Option<i64>,
    },
    /// List saved connections.
    List,
    /// Delete a saved connection.
    Delete { id: i64 },
}
