use colored::Colorize;

use crate::cli::open_db;
use crate::error::Result;
use crate::service::sync_item;
use crate::settings::load_settings;

pub fn run(item_id: &str, credential: Option<i64>) -> Result<()> {
    let settings = load_settings();
    let mut conn = open_db()?;
    let report = sync_item(&mut conn, &settings, item_id, credential)?;

    println!("  Synced:   {}", report.total_synced);
    println!("  Skipped:  {}", report.skipped);
    if report.rejected > 0 {
        println!("  Rejected: {} (unparseable date)", report.rejected);
    }
    for failure in &report.failed_accounts {
        println!("  {} account {}: {}", "Failed".red(), failure.account_id, failure.error);
    }
    if report.success {
        println!("{}", "Sync complete.".green());
    } else {
        println!("{}", "Sync finished with failed accounts.".yellow());
    }
    Ok(())
}
