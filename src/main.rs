mod categorizer;
mod cli;
mod connections;
mod dashboard;
mod db;
mod error;
mod fmt;
mod models;
mod periods;
mod pluggy;
mod reviewer;
mod server;
mod service;
mod settings;
mod sync;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, CredentialsCommands, ItemsCommands, RulesCommands};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(data_dir),
        Commands::Serve { listen } => cli::serve::run(listen),
        Commands::Sync { item_id, credential } => cli::sync::run(&item_id, credential),
        Commands::Import {
            file,
            account,
            account_type,
            bank,
            owner,
        } => cli::import::run(&file, &account, &account_type, &bank, &owner),
        Commands::Dashboard {
            period,
            account_type,
            bank,
            owner,
            limit,
        } => cli::dashboard::run(&period, &account_type, bank, owner, limit),
        Commands::Categorize { id, category } => cli::categorize::run(id, &category),
        Commands::Rules { command } => match command {
            RulesCommands::Add { keyword, category } => cli::rules::add(&keyword, &category),
            RulesCommands::List => cli::rules::list(),
            RulesCommands::Delete { keyword } => cli::rules::delete(&keyword),
        },
        Commands::Credentials { command } => match command {
            CredentialsCommands::Add { name, client_id } => cli::credentials::add(&name, &client_id),
            CredentialsCommands::List => cli::credentials::list(),
            CredentialsCommands::Delete { id } => cli::credentials::delete(id),
        },
        Commands::Items { command } => match command {
            ItemsCommands::Add {
                item_id,
                bank,
                owner,
                credential,
            } => cli::items::add(&item_id, &bank, &owner, credential),
            ItemsCommands::List => cli::items::list(),
            ItemsCommands::Delete { id } => cli::items::delete(id),
        },
        Commands::Periods => cli::periods::run(),
        Commands::Clear { yes } => cli::clear::run(yes),
        Commands::Status => cli::status::run(),
        Commands::Backup { output } => cli::backup::run(output),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
