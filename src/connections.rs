use rusqlite::{Connection, OptionalExtension, Row};
use serde::Deserialize;

use crate::error::{FinboardError, Result};
use crate::models::{Credential, SavedItem};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialInput {
    pub name: String,
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedItemInput {
    pub item_id: String,
    pub bank_name: String,
    pub owner_name: String,
    #[serde(default)]
    pub credential_id: Option<i64>,
}

fn required(field: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(FinboardError::Validation(format!("{field} must not be empty")));
    }
    Ok(value.to_string())
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

fn credential_from_row(row: &Row<'_>) -> rusqlite::Result<Credential> {
    Ok(Credential {
        id: row.get(0)?,
        name: row.get(1)?,
        client_id: row.get(2)?,
        client_secret: row.get(3)?,
        created_at: row.get(4)?,
    })
}

const CREDENTIAL_COLUMNS: &str = "id, name, client_id, client_secret, created_at";

pub fn list_credentials(conn: &Connection) -> Result<Vec<Credential>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CREDENTIAL_COLUMNS} FROM credentials ORDER BY name, id"
    ))?;
    let rows = stmt
        .query_map([], credential_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn get_credential(conn: &Connection, id: i64) -> Result<Credential> {
    conn.query_row(
        &format!("SELECT {CREDENTIAL_COLUMNS} FROM credentials WHERE id = ?1"),
        [id],
        credential_from_row,
    )
    .optional()?
    .ok_or_else(|| FinboardError::NotFound(format!("credential {id}")))
}

/// The credential to sync with: the requested one, or the only one stored.
pub fn resolve_credential(conn: &Connection, id: Option<i64>) -> Result<Credential> {
    if let Some(id) = id {
        return get_credential(conn, id);
    }
    let mut all = list_credentials(conn)?;
    match all.len() {
        1 => Ok(all.remove(0)),
        0 => Err(FinboardError::NotFound("no credentials configured".to_string())),
        n => Err(FinboardError::Validation(format!(
            "{n} credentials configured; pass credential_id"
        ))),
    }
}

pub fn create_credential(conn: &Connection, input: &CredentialInput) -> Result<Credential> {
    conn.execute(
        "INSERT INTO credentials (name, client_id, client_secret) VALUES (?1, ?2, ?3)",
        rusqlite::params![
            required("name", &input.name)?,
            required("clientId", &input.client_id)?,
            required("clientSecret", &input.client_secret)?,
        ],
    )?;
    get_credential(conn, conn.last_insert_rowid())
}

pub fn update_credential(conn: &Connection, id: i64, input: &CredentialInput) -> Result<Credential> {
    let n = conn.execute(
        "UPDATE credentials SET name = ?1, client_id = ?2, client_secret = ?3 WHERE id = ?4",
        rusqlite::params![
            required("name", &input.name)?,
            required("clientId", &input.client_id)?,
            required("clientSecret", &input.client_secret)?,
            id,
        ],
    )?;
    if n == 0 {
        return Err(FinboardError::NotFound(format!("credential {id}")));
    }
    get_credential(conn, id)
}

pub fn delete_credential(conn: &Connection, id: i64) -> Result<()> {
    let n = conn.execute("DELETE FROM credentials WHERE id = ?1", [id])?;
    if n == 0 {
        return Err(FinboardError::NotFound(format!("credential {id}")));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Saved provider items
// ---------------------------------------------------------------------------

fn item_from_row(row: &Row<'_>) -> rusqlite::Result<SavedItem> {
    Ok(SavedItem {
        id: row.get(0)?,
        item_id: row.get(1)?,
        bank_name: row.get(2)?,
        owner_name: row.get(3)?,
        credential_id: row.get(4)?,
        created_at: row.get(5)?,
    })
}

const ITEM_COLUMNS: &str = "id, item_id, bank_name, owner_name, credential_id, created_at";

pub fn list_items(conn: &Connection) -> Result<Vec<SavedItem>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ITEM_COLUMNS} FROM saved_items ORDER BY bank_name, owner_name, id"
    ))?;
    let rows = stmt
        .query_map([], item_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn get_item(conn: &Connection, id: i64) -> Result<SavedItem> {
    conn.query_row(
        &format!("SELECT {ITEM_COLUMNS} FROM saved_items WHERE id = ?1"),
        [id],
        item_from_row,
    )
    .optional()?
    .ok_or_else(|| FinboardError::NotFound(format!("saved item {id}")))
}

/// Saved item for a provider connection id, if the user registered one.
pub fn find_item(conn: &Connection, item_id: &str) -> Result<Option<SavedItem>> {
    let item = conn
        .query_row(
            &format!("SELECT {ITEM_COLUMNS} FROM saved_items WHERE item_id = ?1"),
            [item_id],
            item_from_row,
        )
        .optional()?;
    Ok(item)
}

fn check_credential(conn: &Connection, credential_id: Option<i64>) -> Result<()> {
    if let Some(id) = credential_id {
        get_credential(conn, id)?;
    }
    Ok(())
}

pub fn create_item(conn: &Connection, input: &SavedItemInput) -> Result<SavedItem> {
    let item_id = required("itemId", &input.item_id)?;
    check_credential(conn, input.credential_id)?;
    if find_item(conn, &item_id)?.is_some() {
        return Err(FinboardError::Validation(format!("item {item_id} is already saved")));
    }
    conn.execute(
        "INSERT INTO saved_items (item_id, bank_name, owner_name, credential_id) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![
            item_id,
            required("bankName", &input.bank_name)?,
            required("ownerName", &input.owner_name)?,
            input.credential_id,
        ],
    )?;
    get_item(conn, conn.last_insert_rowid())
}

pub fn update_item(conn: &Connection, id: i64, input: &SavedItemInput) -> Result<SavedItem> {
    let item_id = required("itemId", &input.item_id)?;
    check_credential(conn, input.credential_id)?;
    if let Some(existing) = find_item(conn, &item_id)? {
        if existing.id != id {
            return Err(FinboardError::Validation(format!("item {item_id} is already saved")));
        }
    }
    let n = conn.execute(
        "UPDATE saved_items SET item_id = ?1, bank_name = ?2, owner_name = ?3, credential_id = ?4 \
         WHERE id = ?5",
        rusqlite::params![
            item_id,
            required("bankName", &input.bank_name)?,
            required("ownerName", &input.owner_name)?,
            input.credential_id,
            id,
        ],
    )?;
    if n == 0 {
        return Err(FinboardError::NotFound(format!("saved item {id}")));
    }
    get_item(conn, id)
}

pub fn delete_item(conn: &Connection, id: i64) -> Result<()> {
    let n = conn.execute("DELETE FROM saved_items WHERE id = ?1", [id])?;
    if n == 0 {
        return Err(FinboardError::NotFound(format!("saved item {id}")));
    }
    Ok(())
}
