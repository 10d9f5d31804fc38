use crate::cli::open_db;
use crate::error::Result;
use crate::reviewer::set_category;

pub fn run(id: i64, category: &str) -> Result<()> {
    let mut conn = open_db()?;
    let update = set_category(&mut conn, id, category)?;
    println!(
        "Transaction {id} '{}' \u{2192} {}",
        update.transaction.description, update.transaction.category
    );
    if let Some(keyword) = update.learned_keyword {
        println!("Learned rule: '{keyword}' \u{2192} {}", update.transaction.category);
    }
    Ok(())
}
