use comfy_table::{Cell, Table};
use zeroize::Zeroizing;

use crate::cli::open_db;
use crate::connections::{create_credential, delete_credential, list_credentials, CredentialInput};
use crate::error::Result;

pub fn add(name: &str, client_id: &str) -> Result<()> {
    let secret = Zeroizing::new(rpassword::prompt_password("Client secret: ")?);
    let conn = open_db()?;
    let input = CredentialInput {
        name: name.to_string(),
        client_id: client_id.to_string(),
        client_secret: secret.to_string(),
    };
    let credential = create_credential(&conn, &input)?;
    println!("Saved credential {} ({})", credential.id, credential.name);
    Ok(())
}

pub fn list() -> Result<()> {
    let conn = open_db()?;
    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Client ID", "Created"]);
    for c in list_credentials(&conn)? {
        table.add_row(vec![
            Cell::new(c.id),
            Cell::new(c.name),
            Cell::new(c.client_id),
            Cell::new(c.created_at),
        ]);
    }
    println!("Credentials\n{table}");
    Ok(())
}

pub fn delete(id: i64) -> Result<()> {
    let conn = open_db()?;
    delete_credential(&conn, id)?;
    println!("Deleted credential {id}");
    Ok(())
}
