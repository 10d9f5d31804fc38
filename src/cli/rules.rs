use comfy_table::{Cell, Table};

use crate::categorizer::{delete_rule, load_rules, upsert_rule};
use crate::cli::open_db;
use crate::error::{FinboardError, Result};

pub fn add(keyword: &str, category: &str) -> Result<()> {
    if keyword.trim().is_empty() || category.trim().is_empty() {
        return Err(FinboardError::Validation("keyword and category are required".to_string()));
    }
    let conn = open_db()?;
    upsert_rule(&conn, keyword, category.trim())?;
    println!("Added rule: '{}' \u{2192} {}", keyword.trim().to_lowercase(), category.trim());
    Ok(())
}

pub fn list() -> Result<()> {
    let conn = open_db()?;
    let rules = load_rules(&conn)?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Keyword", "Category"]);
    for rule in rules {
        table.add_row(vec![
            Cell::new(rule.id),
            Cell::new(rule.keyword),
            Cell::new(rule.category),
        ]);
    }
    println!("Rules\n{table}");
    Ok(())
}

pub fn delete(keyword: &str) -> Result<()> {
    let conn = open_db()?;
    if !delete_rule(&conn, keyword)? {
        return Err(FinboardError::NotFound(format!("rule '{keyword}'")));
    }
    println!("Deleted rule '{}'", keyword.trim().to_lowercase());
    Ok(())
}
