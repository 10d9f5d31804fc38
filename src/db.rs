use std::path::Path;

use rusqlite::Connection;

use crate::error::Result;

const SCHEMA_VERSION_TABLE: &str = "
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at TEXT DEFAULT (datetime('now'))
);
";

const CORE_TABLES: &str = "
CREATE TABLE transactions (
    id INTEGER PRIMARY KEY,
    provider_id TEXT NOT NULL UNIQUE,
    date TEXT NOT NULL,
    date_key TEXT NOT NULL,
    amount REAL NOT NULL,
    description TEXT NOT NULL,
    category TEXT NOT NULL,
    source TEXT NOT NULL,
    type TEXT NOT NULL,
    account_id TEXT NOT NULL,
    account_type TEXT NOT NULL,
    bank_name TEXT NOT NULL DEFAULT '',
    owner_name TEXT NOT NULL DEFAULT '',
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE INDEX idx_transactions_date ON transactions(date);
CREATE INDEX idx_transactions_date_key ON transactions(date_key);
CREATE INDEX idx_transactions_category ON transactions(category);
CREATE INDEX idx_transactions_provider_id ON transactions(provider_id);

CREATE TABLE rules (
    id INTEGER PRIMARY KEY,
    keyword TEXT NOT NULL UNIQUE,
    category TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);
";

const CONNECTION_TABLES: &str = "
CREATE TABLE credentials (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    client_id TEXT NOT NULL,
    client_secret TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE saved_items (
    id INTEGER PRIMARY KEY,
    item_id TEXT NOT NULL UNIQUE,
    bank_name TEXT NOT NULL,
    owner_name TEXT NOT NULL,
    credential_id INTEGER,
    created_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (credential_id) REFERENCES credentials(id) ON DELETE SET NULL
);
";

const IDENTITY_INDEX: &str = "
CREATE INDEX idx_transactions_identity ON transactions(bank_name, owner_name);
";

// (keyword, category)
const DEFAULT_RULES: &[(&str, &str)] = &[
    ("smartfit", "Saúde"),
    ("vivo", "Assinaturas"),
    ("claro", "Assinaturas"),
    ("detran", "Impostos e Taxas"),
    ("correios", "Compras"),
    ("petz", "Pets"),
    ("cobasi", "Pets"),
];

enum Step {
    Sql(&'static str),
    Seed,
}

// Ordered; append only. Each entry is applied once and recorded in schema_version.
const MIGRATIONS: &[(i64, &str, Step)] = &[
    (1, "core_tables", Step::Sql(CORE_TABLES)),
    (2, "connection_tables", Step::Sql(CONNECTION_TABLES)),
    (3, "seed_default_rules", Step::Seed),
    (4, "identity_index", Step::Sql(IDENTITY_INDEX)),
];

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn schema_version(conn: &Connection) -> Result<i64> {
    conn.execute_batch(SCHEMA_VERSION_TABLE)?;
    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

/// Apply pending migrations in order. Returns the versions applied by this call.
pub fn migrate(conn: &mut Connection) -> Result<Vec<i64>> {
    let current = schema_version(conn)?;
    let mut applied = Vec::new();
    for (version, name, step) in MIGRATIONS.iter().filter(|(v, _, _)| *v > current) {
        let tx = conn.transaction()?;
        match step {
            Step::Sql(sql) => tx.execute_batch(sql)?,
            Step::Seed => {
                for (keyword, category) in DEFAULT_RULES {
                    tx.execute(
                        "INSERT OR IGNORE INTO rules (keyword, category) VALUES (?1, ?2)",
                        rusqlite::params![keyword, category],
                    )?;
                }
            }
        }
        tx.execute(
            "INSERT INTO schema_version (version, name) VALUES (?1, ?2)",
            rusqlite::params![version, name],
        )?;
        tx.commit()?;
        tracing::info!(version, name, "applied migration");
        applied.push(*version);
    }
    Ok(applied)
}

/// Open the database and bring the schema up to date.
pub fn open(db_path: &Path) -> Result<Connection> {
    let mut conn = get_connection(db_path)?;
    migrate(&mut conn)?;
    Ok(conn)
}

#[cfg(test)]
pub(crate) fn test_db() -> (tempfile::TempDir, Connection) {
    let dir = tempfile::tempdir().unwrap();
    let conn = open(&dir.path().join("test.db")).unwrap();
    (dir, conn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrate_creates_tables() {
        let (_dir, conn) = test_db();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        for expected in &["schema_version", "transactions", "rules", "credentials", "saved_items"] {
            assert!(tables.contains(&expected.to_string()), "missing table: {expected}");
        }
    }

    #[test]
    fn test_migrate_records_version() {
        let (_dir, conn) = test_db();
        assert_eq!(schema_version(&conn).unwrap(), MIGRATIONS.len() as i64);
    }

    #[test]
    fn test_migrate_is_idempotent() {
        let (_dir, mut conn) = test_db();
        let applied = migrate(&mut conn).unwrap();
        assert!(applied.is_empty());
        let rows: i64 = conn
            .query_row("SELECT count(*) FROM schema_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(rows, MIGRATIONS.len() as i64);
    }

    #[test]
    fn test_migrate_seeds_default_rules() {
        let (_dir, conn) = test_db();
        let count: i64 = conn.query_row("SELECT count(*) FROM rules", [], |r| r.get(0)).unwrap();
        assert_eq!(count, DEFAULT_RULES.len() as i64);
    }

    #[test]
    fn test_migrate_resumes_from_partial_schema() {
        let dir = tempfile::tempdir().unwrap();
        let mut conn = get_connection(&dir.path().join("partial.db")).unwrap();
        schema_version(&conn).unwrap();
        conn.execute_batch(CORE_TABLES).unwrap();
        conn.execute(
            "INSERT INTO schema_version (version, name) VALUES (1, 'core_tables')",
            [],
        )
        .unwrap();
        let applied = migrate(&mut conn).unwrap();
        assert_eq!(applied, vec![2, 3, 4]);
    }

    #[test]
    fn test_provider_id_is_unique() {
        let (_dir, conn) = test_db();
        let insert = "INSERT INTO transactions (provider_id, date, date_key, amount, description, \
                      category, source, type, account_id, account_type) \
                      VALUES ('p1', '2024-01-01', '2024-01-01', -1.0, 'x', 'Outros', 'pluggy', 'DEBIT', 'a', 'BANK')";
        conn.execute(insert, []).unwrap();
        assert!(conn.execute(insert, []).is_err());
    }
}
