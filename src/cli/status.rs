use crate::db::{get_connection, schema_version};
use crate::error::Result;
use crate::fmt::format_bytes;
use crate::settings::load_settings;

pub fn run() -> Result<()> {
    let settings = load_settings();
    let db_path = settings.db_path();

    println!("Data dir:   {}", settings.data_dir);
    println!("Database:   {}", db_path.display());
    println!("Listen:     {}", settings.listen_addr);
    println!("Provider:   {}", settings.pluggy_base_url);

    if db_path.exists() {
        let size = std::fs::metadata(&db_path)?.len();
        println!("DB size:    {}", format_bytes(size));

        let conn = get_connection(&db_path)?;
        let count = |table: &str| -> Result<i64> {
            Ok(conn.query_row(&format!("SELECT count(*) FROM {table}"), [], |r| r.get(0))?)
        };

        println!();
        println!("Schema:        v{}", schema_version(&conn)?);
        println!("Transactions:  {}", count("transactions")?);
        println!("Rules:         {}", count("rules")?);
        println!("Credentials:   {}", count("credentials")?);
        println!("Saved items:   {}", count("saved_items")?);
        println!("Cycle rules:   {} override(s)", settings.billing_cycles.overrides.len());
    } else {
        println!();
        println!("Database not found. Run `finboard init` to set up.");
    }

    Ok(())
}
