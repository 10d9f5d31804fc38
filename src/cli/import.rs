use std::path::Path;

use crate::cli::open_db;
use crate::error::{FinboardError, Result};
use crate::models::{AccountInfo, AccountType};
use crate::service::import_file;

pub fn run(file: &str, account: &str, account_type: &str, bank: &str, owner: &str) -> Result<()> {
    let account_type = AccountType::parse(account_type).ok_or_else(|| {
        FinboardError::Validation(format!("invalid account type '{account_type}' (expected BANK or CREDIT)"))
    })?;
    let info = AccountInfo {
        account_type,
        bank_name: bank.trim().to_string(),
        owner_name: owner.trim().to_string(),
    };
    let mut conn = open_db()?;
    let result = import_file(&mut conn, Path::new(file), account, &info)?;

    println!("  Imported: {}", result.inserted);
    println!("  Skipped:  {}", result.skipped);
    if result.rejected > 0 {
        println!("  Rejected: {} (unparseable date)", result.rejected);
    }
    Ok(())
}
