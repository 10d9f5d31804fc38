use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::backup::Backup;
use rusqlite::Connection;

use crate::cli::open_db;
use crate::db::schema_version;
use crate::error::{FinboardError, Result};
use crate::fmt::format_bytes;
use crate::settings::load_settings;

fn default_destination(data_dir: &str, version: i64) -> Result<PathBuf> {
    let backups_dir = PathBuf::from(data_dir).join("backups");
    std::fs::create_dir_all(&backups_dir)?;
    let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
    Ok(backups_dir.join(format!("finboard-v{version}-{stamp}.db")))
}

fn transaction_count(conn: &Connection) -> Result<i64> {
    Ok(conn.query_row("SELECT count(*) FROM transactions", [], |r| r.get(0))?)
}

/// Online copy of the live store. The copy is reopened and checked against
/// the source before it is reported.
fn copy_store(source: &Connection, dest_path: &Path) -> Result<Connection> {
    let mut dest = Connection::open(dest_path)?;
    {
        let backup = Backup::new(source, &mut dest)?;
        backup.run_to_completion(100, Duration::from_millis(10), None)?;
    }
    Ok(dest)
}

pub fn run(output: Option<String>) -> Result<()> {
    let settings = load_settings();
    let conn = open_db()?;
    let version = schema_version(&conn)?;
    let rows = transaction_count(&conn)?;

    let dest_path = match output {
        Some(p) => PathBuf::from(p),
        None => default_destination(&settings.data_dir, version)?,
    };
    if dest_path.exists() {
        return Err(FinboardError::Validation(format!(
            "{} already exists; choose another --output",
            dest_path.display()
        )));
    }

    let dest = copy_store(&conn, &dest_path)?;
    let copied_version = schema_version(&dest)?;
    let copied_rows = transaction_count(&dest)?;
    if copied_version != version || copied_rows != rows {
        return Err(FinboardError::Other(format!(
            "backup mismatch: v{copied_version} with {copied_rows} transaction(s), expected v{version} with {rows}"
        )));
    }

    let size = std::fs::metadata(&dest_path)?.len();
    tracing::info!(path = %dest_path.display(), size, version, rows, "backup written");
    println!("Backup saved to {}", dest_path.display());
    println!("Schema:        v{version}");
    println!("Transactions:  {rows}");
    println!("Size:          {}", format_bytes(size));
    Ok(())
}
