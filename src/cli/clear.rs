use crate::cli::open_db;
use crate::error::{FinboardError, Result};
use crate::reviewer::clear_transactions;

pub fn run(yes: bool) -> Result<()> {
    if !yes {
        return Err(FinboardError::Validation(
            "this deletes every transaction; pass --yes to confirm".to_string(),
        ));
    }
    let conn = open_db()?;
    let deleted = clear_transactions(&conn)?;
    println!("Deleted {deleted} transaction(s). Rules and connections were kept.");
    Ok(())
}
