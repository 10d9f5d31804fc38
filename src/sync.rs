use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::categorizer::Categorizer;
use crate::error::Result;
use crate::models::{AccountInfo, RawTransaction, Source, MISSING_DESCRIPTION};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncResult {
    pub inserted: usize,
    pub skipped: usize,
    pub rejected: usize,
}

/// Calendar day of a source timestamp, as written by the source. Accepts
/// `YYYY-MM-DD`, RFC 3339 and offset-less date-times.
pub fn parse_day(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local().date());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.date())
}

pub fn to_cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

/// Stable id for records the source sends without one, so re-syncs of the
/// same event land on the same key.
pub fn synthesize_provider_id(account_id: &str, date: &str, amount: f64, description: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{account_id}|{date}|{amount:.2}|{description}").as_bytes());
    let digest = hex::encode(hasher.finalize());
    format!("syn-{}", &digest[..32])
}

fn clean_description(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        Some(d) if !d.is_empty() => d.to_string(),
        _ => MISSING_DESCRIPTION.to_string(),
    }
}

/// Reconcile one account's batch into the store.
///
/// Runs as a single unit of work: a storage fault rolls back every insert of
/// this call. Records already present, either under the same provider id or
/// under the same (day, cents, description, bank, owner, source) key, are
/// skipped. That secondary key also merges genuinely distinct same-day
/// look-alikes, which keeps re-syncs with unstable provider ids from
/// duplicating rows.
pub fn sync_transactions(
    conn: &mut Connection,
    raw: &[RawTransaction],
    account_id: &str,
    info: &AccountInfo,
    source: Source,
) -> Result<SyncResult> {
    let categorizer = Categorizer::load(conn)?;
    let tx = conn.transaction()?;
    let mut result = SyncResult::default();
    {
        let mut dup_stmt = tx.prepare_cached(
            "SELECT 1 FROM transactions WHERE date_key = ?1 \
             AND CAST(ROUND(amount * 100) AS INTEGER) = ?2 AND description = ?3 \
             AND bank_name = ?4 AND owner_name = ?5 AND source = ?6",
        )?;
        let mut insert_stmt = tx.prepare_cached(
            "INSERT INTO transactions (provider_id, date, date_key, amount, description, category, \
             source, type, account_id, account_type, bank_name, owner_name) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12) \
             ON CONFLICT(provider_id) DO NOTHING",
        )?;

        for record in raw {
            let Some(day) = parse_day(&record.date) else {
                tracing::warn!(account_id, date = %record.date, "rejecting record with malformed date");
                result.rejected += 1;
                continue;
            };
            if !record.amount.is_finite() {
                tracing::warn!(account_id, date = %record.date, "rejecting record with non-numeric amount");
                result.rejected += 1;
                continue;
            }

            let amount = record.kind.normalize_amount(record.amount);
            let description = clean_description(record.description.as_deref());
            let provider_id = match record.id.as_deref().map(str::trim) {
                Some(id) if !id.is_empty() => id.to_string(),
                _ => synthesize_provider_id(account_id, &record.date, amount, &description),
            };
            let category = categorizer.classify(&description, amount, Some(day));
            let date_key = day.format("%Y-%m-%d").to_string();

            if dup_stmt.exists(rusqlite::params![
                date_key,
                to_cents(amount),
                description,
                info.bank_name,
                info.owner_name,
                source,
            ])? {
                tracing::debug!(provider_id, "skipping duplicate");
                result.skipped += 1;
                continue;
            }

            let inserted = insert_stmt.execute(rusqlite::params![
                provider_id,
                record.date,
                date_key,
                amount,
                description,
                category,
                source,
                record.kind,
                account_id,
                info.account_type,
                info.bank_name,
                info.owner_name,
            ])?;
            if inserted == 0 {
                tracing::debug!(provider_id, "provider id already stored");
                result.skipped += 1;
            } else {
                result.inserted += 1;
            }
        }
    }
    tx.commit()?;

    tracing::info!(
        account_id,
        inserted = result.inserted,
        skipped = result.skipped,
        rejected = result.rejected,
        "synced account"
    );
    Ok(result)
}
