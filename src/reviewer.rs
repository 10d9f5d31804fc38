use rusqlite::{Connection, OptionalExtension};

use crate::categorizer::{rule_keyword, upsert_rule};
use crate::error::{FinboardError, Result};
use crate::models::Transaction;

/// Outcome of a manual recategorization.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryUpdate {
    pub transaction: Transaction,
    /// Keyword the rule store learned, if the description had one.
    pub learned_keyword: Option<String>,
}

pub fn get_transaction(conn: &Connection, id: i64) -> Result<Option<Transaction>> {
    let sql = format!("SELECT {} FROM transactions t WHERE t.id = ?1", Transaction::COLUMNS);
    let txn = conn.query_row(&sql, [id], Transaction::from_row).optional()?;
    Ok(txn)
}

/// Override one transaction's category and teach the rule store the
/// description's first word. Both writes commit together or not at all.
pub fn set_category(conn: &mut Connection, id: i64, category: &str) -> Result<CategoryUpdate> {
    let category = category.trim();
    if category.is_empty() {
        return Err(FinboardError::Validation("category must not be empty".to_string()));
    }

    let tx = conn.transaction()?;
    let Some(mut transaction) = get_transaction(&tx, id)? else {
        return Err(FinboardError::NotFound(format!("transaction {id}")));
    };
    tx.execute(
        "UPDATE transactions SET category = ?1 WHERE id = ?2",
        rusqlite::params![category, id],
    )?;
    let learned_keyword = rule_keyword(&transaction.description);
    if let Some(keyword) = &learned_keyword {
        upsert_rule(&tx, keyword, category)?;
    }
    tx.commit()?;

    tracing::info!(id, category, keyword = ?learned_keyword, "category updated");
    transaction.category = category.to_string();
    Ok(CategoryUpdate {
        transaction,
        learned_keyword,
    })
}

/// Delete every stored transaction. Rules and connections are kept.
pub fn clear_transactions(conn: &Connection) -> Result<usize> {
    let deleted = conn.execute("DELETE FROM transactions", [])?;
    tracing::warn!(deleted, "transactions cleared");
    Ok(deleted)
}
