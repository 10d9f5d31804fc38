use chrono::Local;
use comfy_table::{Cell, Table};

use crate::cli::open_db;
use crate::dashboard::{get_dashboard, DashboardQuery, Filters};
use crate::error::Result;
use crate::fmt::{money, short_date, signed_money};
use crate::settings::load_settings;

pub fn run(
    period: &str,
    account_type: &str,
    bank: Option<String>,
    owner: Option<String>,
    limit: u32,
) -> Result<()> {
    let settings = load_settings();
    settings.billing_cycles.validate()?;
    let filters = Filters::parse(&DashboardQuery {
        period: Some(period.to_string()),
        account_type: Some(account_type.to_string()),
        bank_name: bank,
        owner_name: owner,
    })?;
    let conn = open_db()?;
    let d = get_dashboard(
        &conn,
        &settings.billing_cycles,
        &filters,
        Local::now().date_naive(),
        limit.min(settings.transaction_page_limit),
    )?;

    println!("Period: {}", d.filters.selected.period);
    println!();
    println!("  Bank balance (now):     {}", signed_money(d.current_bank_balance));
    println!("  Balance (filtered):     {}", signed_money(d.total_balance));
    println!("  Opening balance:        {}", signed_money(d.initial_balance));
    println!("  Income:                 {}", money(d.period_income));
    println!("  Expenses:               {}", money(d.period_expenses));
    println!("  Movement:               {}", signed_money(d.period_movement));
    println!("  Closing balance:        {}", signed_money(d.end_of_period_balance));
    println!("  Credit card bill:       {}", money(d.credit_card_bill));

    if !d.category_totals.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["Category", "Spent", "Count"]);
        for c in &d.category_totals {
            table.add_row(vec![
                Cell::new(&c.category),
                Cell::new(money(c.total)),
                Cell::new(c.count),
            ]);
        }
        println!("\nSpending by category\n{table}");
    }

    if d.transactions.is_empty() {
        println!("\nNo transactions for these filters.");
        return Ok(());
    }
    let mut table = Table::new();
    table.set_header(vec!["ID", "Date", "Description", "Amount", "Category", "Type", "Bank", "Owner"]);
    for t in &d.transactions {
        table.add_row(vec![
            Cell::new(t.id),
            Cell::new(short_date(&t.date)),
            Cell::new(&t.description),
            Cell::new(signed_money(t.amount)),
            Cell::new(&t.category),
            Cell::new(t.account_type.as_str()),
            Cell::new(&t.bank_name),
            Cell::new(&t.owner_name),
        ]);
    }
    println!("\nTransactions\n{table}");
    Ok(())
}
