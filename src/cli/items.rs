use comfy_table::{Cell, Table};

use crate::cli::open_db;
use crate::connections::{create_item, delete_item, list_items, SavedItemInput};
use crate::error::Result;

pub fn add(item_id: &str, bank: &str, owner: &str, credential: Option<i64>) -> Result<()> {
    let conn = open_db()?;
    let item = create_item(
        &conn,
        &SavedItemInput {
            item_id: item_id.to_string(),
            bank_name: bank.to_string(),
            owner_name: owner.to_string(),
            credential_id: credential,
        },
    )?;
    println!("Saved item {} ({} / {})", item.item_id, item.bank_name, item.owner_name);
    Ok(())
}

pub fn list() -> Result<()> {
    let conn = open_db()?;
    let mut table = Table::new();
    table.set_header(vec!["ID", "Item", "Bank", "Owner", "Credential"]);
    for item in list_items(&conn)? {
        table.add_row(vec![
            Cell::new(item.id),
            Cell::new(item.item_id),
            Cell::new(item.bank_name),
            Cell::new(item.owner_name),
            Cell::new(item.credential_id.map(|c| c.to_string()).unwrap_or_default()),
        ]);
    }
    println!("Saved items\n{table}");
    Ok(())
}

pub fn delete(id: i64) -> Result<()> {
    let conn = open_db()?;
    delete_item(&conn, id)?;
    println!("Deleted item {id}");
    Ok(())
}
