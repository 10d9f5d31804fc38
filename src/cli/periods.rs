use chrono::Local;
use comfy_table::{Cell, Table};

use crate::error::Result;
use crate::periods::available_periods;

pub fn run() -> Result<()> {
    let mut table = Table::new();
    table.set_header(vec!["Value", "Label", "Cycle start", "Cycle end"]);
    for p in available_periods(Local::now().date_naive())? {
        let day = |d: Option<chrono::NaiveDateTime>| d.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default();
        table.add_row(vec![
            Cell::new(&p.value),
            Cell::new(&p.label),
            Cell::new(day(p.start)),
            Cell::new(day(p.end)),
        ]);
    }
    println!("Periods\n{table}");
    Ok(())
}
