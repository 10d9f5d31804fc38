use std::collections::HashMap;

use chrono::NaiveDate;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::error::{FinboardError, Result};
use crate::models::{AccountType, Transaction};
use crate::periods::{
    available_periods, calendar_month, current_cycle_month, cycle_period, cycle_window,
    CycleTable, Period, PeriodOption,
};

/// Negative-signed records the source reports for money coming in. They are
/// never spending.
const INBOUND_MARKERS: &[&str] = &[
    "transferência recebida",
    "transferencia recebida",
    "pix recebido",
    "ted recebida",
    "pagamento recebido",
    "pagamento de fatura recebido",
];

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// Dashboard query as sent by the presentation layer.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardQuery {
    pub period: Option<String>,
    pub account_type: Option<String>,
    pub bank_name: Option<String>,
    pub owner_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountFilter {
    All,
    Only(AccountType),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filters {
    pub period: Period,
    pub account: AccountFilter,
    pub bank_name: Option<String>,
    pub owner_name: Option<String>,
}

fn selected(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("all"))
        .map(str::to_string)
}

impl Filters {
    pub fn parse(query: &DashboardQuery) -> Result<Self> {
        let period = Period::parse(query.period.as_deref())?;
        let account = match selected(query.account_type.as_deref()) {
            None => AccountFilter::All,
            Some(raw) => AccountFilter::Only(AccountType::parse(&raw).ok_or_else(|| {
                FinboardError::Validation(format!(
                    "invalid accountType '{raw}' (expected BANK, CREDIT or all)"
                ))
            })?),
        };
        Ok(Self {
            period,
            account,
            bank_name: selected(query.bank_name.as_deref()),
            owner_name: selected(query.owner_name.as_deref()),
        })
    }

    fn includes(&self, account_type: AccountType) -> bool {
        match self.account {
            AccountFilter::All => true,
            AccountFilter::Only(t) => t == account_type,
        }
    }
}

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    /// Spending magnitude (positive).
    pub total: f64,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedFilters {
    pub period: String,
    pub account_type: String,
    pub bank_name: Option<String>,
    pub owner_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub bank_names: Vec<String>,
    pub owner_names: Vec<String>,
    pub account_types: Vec<String>,
    pub periods: Vec<PeriodOption>,
    pub selected: SelectedFilters,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub transactions: Vec<Transaction>,
    pub category_totals: Vec<CategoryTotal>,
    pub total_balance: f64,
    pub period_expenses: f64,
    pub period_income: f64,
    pub period_movement: f64,
    pub initial_balance: f64,
    pub end_of_period_balance: f64,
    pub current_bank_balance: f64,
    pub credit_card_bill: f64,
    pub filters: FilterOptions,
}

// ---------------------------------------------------------------------------
// SQL predicates
// ---------------------------------------------------------------------------

type Clause = (String, Vec<String>);

fn and(clauses: &[&Clause]) -> Clause {
    let sql = clauses
        .iter()
        .map(|(s, _)| format!("({s})"))
        .collect::<Vec<_>>()
        .join(" AND ");
    let params = clauses.iter().flat_map(|(_, p)| p.iter().cloned()).collect();
    (sql, params)
}

fn identity_clause(filters: &Filters) -> Clause {
    let mut sql = vec!["1 = 1".to_string()];
    let mut params = Vec::new();
    if let Some(bank) = &filters.bank_name {
        sql.push("t.bank_name = ?".to_string());
        params.push(bank.clone());
    }
    if let Some(owner) = &filters.owner_name {
        sql.push("t.owner_name = ?".to_string());
        params.push(owner.clone());
    }
    (sql.join(" AND "), params)
}

fn type_clause(account_type: AccountType) -> Clause {
    ("t.account_type = ?".to_string(), vec![account_type.as_str().to_string()])
}

fn day_range(start: String, end: String) -> Clause {
    ("t.date_key BETWEEN ? AND ?".to_string(), vec![start, end])
}

fn credit_identities(conn: &Connection) -> Result<Vec<(String, String)>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT bank_name, owner_name FROM transactions \
         WHERE account_type = ?1 ORDER BY bank_name, owner_name",
    )?;
    let pairs = stmt
        .query_map([AccountType::Credit], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(pairs)
}

/// Credit rows inside their own identity's billing cycle for `year`/`month`.
fn credit_cycle_clause(conn: &Connection, cycles: &CycleTable, year: i32, month: u32) -> Result<Clause> {
    let mut parts = Vec::new();
    let mut params = Vec::new();
    for (bank, owner) in credit_identities(conn)? {
        let window = cycle_period(cycles, year, month, Some(&bank), Some(&owner))?;
        parts.push("(t.bank_name = ? AND t.owner_name = ? AND t.date_key BETWEEN ? AND ?)");
        params.extend([bank, owner, window.start_key(), window.end_key()]);
    }
    if parts.is_empty() {
        return Ok(("0".to_string(), Vec::new()));
    }
    let (type_sql, mut type_params) = type_clause(AccountType::Credit);
    type_params.extend(params);
    Ok((format!("{type_sql} AND ({})", parts.join(" OR ")), type_params))
}

fn bank_month_clause(year: i32, month: u32) -> Result<Clause> {
    let window = calendar_month(year, month)?;
    Ok(and(&[
        &type_clause(AccountType::Bank),
        &day_range(window.start_key(), window.end_key()),
    ]))
}

/// One predicate covering every requested account type: bank rows by
/// calendar month, credit rows by their resolved billing cycle.
fn period_clause(conn: &Connection, cycles: &CycleTable, filters: &Filters) -> Result<Clause> {
    let Period::Month { year, month } = filters.period else {
        return Ok(match filters.account {
            AccountFilter::All => ("1 = 1".to_string(), Vec::new()),
            AccountFilter::Only(t) => type_clause(t),
        });
    };
    let mut parts = Vec::new();
    let mut params = Vec::new();
    if filters.includes(AccountType::Bank) {
        let (sql, p) = bank_month_clause(year, month)?;
        parts.push(format!("({sql})"));
        params.extend(p);
    }
    if filters.includes(AccountType::Credit) {
        let (sql, p) = credit_cycle_clause(conn, cycles, year, month)?;
        parts.push(format!("({sql})"));
        params.extend(p);
    }
    Ok((parts.join(" OR "), params))
}

fn sum_amount(conn: &Connection, clause: &Clause) -> Result<f64> {
    let sql = format!(
        "SELECT COALESCE(SUM(t.amount), 0) FROM transactions t WHERE {}",
        clause.0
    );
    let mut stmt = conn.prepare(&sql)?;
    let total: f64 = stmt.query_row(rusqlite::params_from_iter(clause.1.iter()), |row| row.get(0))?;
    Ok(total)
}

fn distinct_values(conn: &Connection, column: &str) -> Result<Vec<String>> {
    let sql = format!(
        "SELECT DISTINCT {column} FROM transactions WHERE {column} <> '' ORDER BY {column}"
    );
    let mut stmt = conn.prepare(&sql)?;
    let values = stmt
        .query_map([], |row| row.get(0))?
        .collect::<std::result::Result<Vec<String>, _>>()?;
    Ok(values)
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

pub fn is_inbound_reversal(description: &str) -> bool {
    let desc = description.to_lowercase();
    INBOUND_MARKERS.iter().any(|m| desc.contains(m))
}

fn category_totals(conn: &Connection, scope: &Clause) -> Result<Vec<CategoryTotal>> {
    let sql = format!(
        "SELECT t.category, t.amount, t.description FROM transactions t \
         WHERE ({}) AND t.amount < 0",
        scope.0
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(rusqlite::params_from_iter(scope.1.iter()), |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?, row.get::<_, String>(2)?))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut by_category: HashMap<String, (f64, i64)> = HashMap::new();
    for (category, amount, description) in rows {
        if is_inbound_reversal(&description) {
            continue;
        }
        let entry = by_category.entry(category).or_insert((0.0, 0));
        entry.0 += amount;
        entry.1 += 1;
    }

    let mut totals: Vec<CategoryTotal> = by_category
        .into_iter()
        .map(|(category, (sum, count))| CategoryTotal {
            category,
            total: round_cents(sum.abs()),
            count,
        })
        .collect();
    totals.sort_by(|a, b| {
        b.total
            .total_cmp(&a.total)
            .then_with(|| a.category.cmp(&b.category))
    });
    Ok(totals)
}

fn list_transactions(conn: &Connection, scope: &Clause, limit: u32) -> Result<Vec<Transaction>> {
    let sql = format!(
        "SELECT {} FROM transactions t WHERE {} \
         ORDER BY t.date_key DESC, t.date DESC, t.id DESC LIMIT {limit}",
        Transaction::COLUMNS,
        scope.0
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(rusqlite::params_from_iter(scope.1.iter()), Transaction::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

struct BankFigures {
    income: f64,
    expenses: f64,
    movement: f64,
    end_balance: f64,
    initial_balance: f64,
}

/// Historical bank snapshot rolled backward from the lifetime balance: there
/// is no stored opening balance, only the ledger.
fn bank_figures(conn: &Connection, filters: &Filters, total_balance: f64) -> Result<BankFigures> {
    let identity = identity_clause(filters);
    let bank = type_clause(AccountType::Bank);

    let (in_period, after_period) = match filters.period {
        Period::All => (and(&[&identity, &bank]), None),
        Period::Month { year, month } => {
            let window = calendar_month(year, month)?;
            let in_period = and(&[&identity, &bank_month_clause(year, month)?]);
            let after = and(&[
                &identity,
                &bank,
                &("t.date_key > ?".to_string(), vec![window.end_key()]),
            ]);
            (in_period, Some(after))
        }
    };

    let income = sum_amount(conn, &and(&[&in_period, &("t.amount > 0".to_string(), Vec::new())]))?;
    let expenses = -sum_amount(conn, &and(&[&in_period, &("t.amount < 0".to_string(), Vec::new())]))?;
    let movement = income - expenses;
    let later = match &after_period {
        Some(clause) => sum_amount(conn, clause)?,
        None => 0.0,
    };
    let end_balance = total_balance - later;

    Ok(BankFigures {
        income: round_cents(income),
        expenses: round_cents(expenses),
        movement: round_cents(movement),
        end_balance: round_cents(end_balance),
        initial_balance: round_cents(end_balance - movement),
    })
}

fn credit_card_bill(
    conn: &Connection,
    cycles: &CycleTable,
    filters: &Filters,
    today: NaiveDate,
) -> Result<f64> {
    let identity = identity_clause(filters);
    let cycle = match filters.period {
        Period::Month { year, month } => credit_cycle_clause(conn, cycles, year, month)?,
        Period::All => {
            let (year, month) = current_cycle_month(cycles.default, today)?;
            let window = cycle_window(cycles.default, year, month)?;
            and(&[
                &type_clause(AccountType::Credit),
                &day_range(window.start_key(), window.end_key()),
            ])
        }
    };
    let charges = sum_amount(
        conn,
        &and(&[&identity, &cycle, &("t.amount < 0".to_string(), Vec::new())]),
    )?;
    Ok(round_cents(charges.abs()))
}

/// Answer a dashboard query. Never fails on an empty result set.
pub fn get_dashboard(
    conn: &Connection,
    cycles: &CycleTable,
    filters: &Filters,
    today: NaiveDate,
    page_limit: u32,
) -> Result<Dashboard> {
    let identity = identity_clause(filters);
    let scope = and(&[&identity, &period_clause(conn, cycles, filters)?]);

    let transactions = list_transactions(conn, &scope, page_limit)?;
    let category_totals = category_totals(conn, &scope)?;

    let bank = type_clause(AccountType::Bank);
    let total_balance = sum_amount(conn, &and(&[&identity, &bank]))?;
    let current_bank_balance = sum_amount(conn, &bank)?;
    let figures = bank_figures(conn, filters, total_balance)?;
    let credit_card_bill = credit_card_bill(conn, cycles, filters, today)?;

    let filters_meta = FilterOptions {
        bank_names: distinct_values(conn, "bank_name")?,
        owner_names: distinct_values(conn, "owner_name")?,
        account_types: distinct_values(conn, "account_type")?,
        periods: available_periods(today)?,
        selected: SelectedFilters {
            period: filters.period.key(),
            account_type: match filters.account {
                AccountFilter::All => "all".to_string(),
                AccountFilter::Only(t) => t.as_str().to_string(),
            },
            bank_name: filters.bank_name.clone(),
            owner_name: filters.owner_name.clone(),
        },
    };

    tracing::debug!(
        period = %filters.period.key(),
        transactions = transactions.len(),
        categories = category_totals.len(),
        "dashboard computed"
    );

    Ok(Dashboard {
        transactions,
        category_totals,
        total_balance: round_cents(total_balance),
        period_expenses: figures.expenses,
        period_income: figures.income,
        period_movement: figures.movement,
        initial_balance: figures.initial_balance,
        end_of_period_balance: figures.end_balance,
        current_bank_balance: round_cents(current_bank_balance),
        credit_card_bill,
        filters: filters_meta,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_db;
    use crate::models::{AccountInfo, RawTransaction, Source, TransactionType};
    use crate::periods::CycleOverride;
    use crate::sync::sync_transactions;

    fn cycles() -> CycleTable {
        CycleTable {
            overrides: vec![CycleOverride {
                bank: "Nubank".to_string(),
                owner: "Ana".to_string(),
                start_day: 27,
                end_day: 26,
            }],
            ..CycleTable::default()
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
    }

    fn query(period: &str, account_type: &str) -> Filters {
        Filters::parse(&DashboardQuery {
            period: Some(period.to_string()),
            account_type: Some(account_type.to_string()),
            ..DashboardQuery::default()
        })
        .unwrap()
    }

    fn ingest(
        conn: &mut Connection,
        account_id: &str,
        account_type: AccountType,
        bank: &str,
        owner: &str,
        rows: &[(&str, f64, &str)],
    ) {
        let raw: Vec<RawTransaction> = rows
            .iter()
            .enumerate()
            .map(|(i, (date, amount, desc))| RawTransaction {
                id: Some(format!("{account_id}-{i}")),
                date: date.to_string(),
                amount: amount.abs(),
                description: Some(desc.to_string()),
                kind: if *amount < 0.0 { TransactionType::Debit } else { TransactionType::Credit },
            })
            .collect();
        let info = AccountInfo {
            account_type,
            bank_name: bank.to_string(),
            owner_name: owner.to_string(),
        };
        sync_transactions(conn, &raw, account_id, &info, Source::Pluggy).unwrap();
    }

    fn seed_bank(conn: &mut Connection) {
        ingest(conn, "chk", AccountType::Bank, "Nubank", "Ana", &[
            ("2024-01-10", 1000.0, "Salário Janeiro"),
            ("2024-02-05", -200.0, "Mercado Bom Preço"),
            ("2024-03-15T09:30:00.000Z", -50.0, "Padaria Central"),
        ]);
    }

    fn seed_credit(conn: &mut Connection) {
        ingest(conn, "nu-card", AccountType::Credit, "Nubank", "Ana", &[
            ("2024-02-27", -100.0, "Amazon Marketplace"),
            ("2024-03-27", -40.0, "Netflix"),
        ]);
        ingest(conn, "itau-card", AccountType::Credit, "Itaú", "Bruno", &[
            ("2024-02-28", -70.0, "Posto Shell"),
            ("2024-02-29", -30.0, "Drogasil"),
            ("2024-03-28", -20.0, "Uber Trip"),
        ]);
    }

    #[test]
    fn test_empty_store_degrades_to_zeroes() {
        let (_dir, conn) = test_db();
        let d = get_dashboard(&conn, &cycles(), &query("2024-03", "all"), today(), 500).unwrap();
        assert!(d.transactions.is_empty());
        assert!(d.category_totals.is_empty());
        assert_eq!(d.total_balance, 0.0);
        assert_eq!(d.end_of_period_balance, 0.0);
        assert_eq!(d.credit_card_bill, 0.0);
        assert_eq!(d.filters.periods.len(), 13);
        assert!(d.filters.bank_names.is_empty());
    }

    #[test]
    fn test_balance_reconstruction_for_past_period() {
        let (_dir, mut conn) = test_db();
        seed_bank(&mut conn);
        let d = get_dashboard(&conn, &cycles(), &query("2024-02", "BANK"), today(), 500).unwrap();
        // Lifetime: 1000 - 200 - 50 = 750. After February: -50.
        assert_eq!(d.total_balance, 750.0);
        assert_eq!(d.end_of_period_balance, 800.0);
        assert_eq!(d.period_income, 0.0);
        assert_eq!(d.period_expenses, 200.0);
        assert_eq!(d.period_movement, -200.0);
        assert_eq!(d.initial_balance, 1000.0);
    }

    #[test]
    fn test_all_time_balance() {
        let (_dir, mut conn) = test_db();
        seed_bank(&mut conn);
        let d = get_dashboard(&conn, &cycles(), &query("all", "all"), today(), 500).unwrap();
        assert_eq!(d.end_of_period_balance, 750.0);
        assert_eq!(d.period_income, 1000.0);
        assert_eq!(d.period_expenses, 250.0);
        assert_eq!(d.initial_balance, 0.0);
        assert_eq!(d.transactions.len(), 3);
    }

    #[test]
    fn test_credit_rows_follow_identity_cycle() {
        let (_dir, mut conn) = test_db();
        seed_bank(&mut conn);
        seed_credit(&mut conn);
        let d = get_dashboard(&conn, &cycles(), &query("2024-03", "CREDIT"), today(), 500).unwrap();
        let mut descriptions: Vec<&str> = d.transactions.iter().map(|t| t.description.as_str()).collect();
        descriptions.sort();
        assert_eq!(descriptions, vec!["Amazon Marketplace", "Drogasil", "Uber Trip"]);
        assert_eq!(d.credit_card_bill, 150.0);
    }

    #[test]
    fn test_mixed_types_single_predicate_without_double_count() {
        let (_dir, mut conn) = test_db();
        seed_bank(&mut conn);
        seed_credit(&mut conn);
        let d = get_dashboard(&conn, &cycles(), &query("2024-03", "all"), today(), 500).unwrap();
        // 3 credit rows in their cycles + 1 bank row in the calendar month.
        assert_eq!(d.transactions.len(), 4);
        let ids: std::collections::HashSet<i64> = d.transactions.iter().map(|t| t.id).collect();
        assert_eq!(ids.len(), 4);
        // Bank figures stay bank-only.
        assert_eq!(d.period_expenses, 50.0);
        assert_eq!(d.total_balance, 750.0);
    }

    #[test]
    fn test_bank_rows_use_calendar_month() {
        let (_dir, mut conn) = test_db();
        ingest(&mut conn, "chk", AccountType::Bank, "Nubank", "Ana", &[
            ("2024-02-29", -10.0, "Fim do mês"),
            ("2024-03-01", -20.0, "Começo do mês"),
            ("2024-03-31", -30.0, "Último dia"),
        ]);
        let d = get_dashboard(&conn, &cycles(), &query("2024-03", "BANK"), today(), 500).unwrap();
        assert_eq!(d.transactions.len(), 2);
        assert_eq!(d.period_expenses, 50.0);
    }

    #[test]
    fn test_credit_bill_for_all_time_uses_current_default_cycle() {
        let (_dir, mut conn) = test_db();
        seed_credit(&mut conn);
        let d = get_dashboard(&conn, &cycles(), &query("all", "all"), today(), 500).unwrap();
        // Today 2024-03-10 -> default cycle 2024-02-29..2024-03-28 for every card.
        assert_eq!(d.credit_card_bill, 90.0);
    }

    #[test]
    fn test_category_totals_exclude_inbound_reversals() {
        let (_dir, mut conn) = test_db();
        ingest(&mut conn, "chk", AccountType::Bank, "Nubank", "Ana", &[
            ("2024-03-02", -80.0, "Transferência recebida de Bruno"),
            ("2024-03-03", -120.0, "Mercado Bom Preço"),
            ("2024-03-04", -30.0, "Mercado da Esquina"),
            ("2024-03-05", -60.0, "Farmácia Popular"),
            ("2024-03-06", 500.0, "Salário Março"),
        ]);
        let d = get_dashboard(&conn, &cycles(), &query("2024-03", "all"), today(), 500).unwrap();
        let categories: Vec<(&str, f64)> = d
            .category_totals
            .iter()
            .map(|c| (c.category.as_str(), c.total))
            .collect();
        assert_eq!(categories, vec![("Supermercado", 150.0), ("Saúde", 60.0)]);
        assert_eq!(d.category_totals[0].count, 2);
    }

    #[test]
    fn test_identity_filters_and_metadata() {
        let (_dir, mut conn) = test_db();
        seed_bank(&mut conn);
        seed_credit(&mut conn);
        let filters = Filters::parse(&DashboardQuery {
            period: Some("2024-03".to_string()),
            account_type: Some("all".to_string()),
            bank_name: Some("Itaú".to_string()),
            owner_name: None,
        })
        .unwrap();
        let d = get_dashboard(&conn, &cycles(), &filters, today(), 500).unwrap();
        assert!(d.transactions.iter().all(|t| t.bank_name == "Itaú"));
        assert_eq!(d.transactions.len(), 2);
        assert_eq!(d.total_balance, 0.0);
        assert_eq!(d.current_bank_balance, 750.0);
        assert_eq!(d.filters.bank_names, vec!["Itaú".to_string(), "Nubank".to_string()]);
        assert_eq!(d.filters.owner_names, vec!["Ana".to_string(), "Bruno".to_string()]);
        assert_eq!(d.filters.account_types, vec!["BANK".to_string(), "CREDIT".to_string()]);
        assert_eq!(d.filters.selected.bank_name.as_deref(), Some("Itaú"));
    }

    #[test]
    fn test_transactions_sorted_desc_and_capped() {
        let (_dir, mut conn) = test_db();
        seed_bank(&mut conn);
        let d = get_dashboard(&conn, &cycles(), &query("all", "all"), today(), 2).unwrap();
        assert_eq!(d.transactions.len(), 2);
        assert_eq!(d.transactions[0].description, "Padaria Central");
        assert_eq!(d.transactions[1].description, "Mercado Bom Preço");
    }

    #[test]
    fn test_invalid_filters_rejected() {
        let bad_type = DashboardQuery {
            account_type: Some("SAVINGS".to_string()),
            ..DashboardQuery::default()
        };
        assert!(matches!(Filters::parse(&bad_type), Err(FinboardError::Validation(_))));
        let bad_period = DashboardQuery {
            period: Some("2024/03".to_string()),
            ..DashboardQuery::default()
        };
        assert!(matches!(Filters::parse(&bad_period), Err(FinboardError::Validation(_))));
    }

    #[test]
    fn test_inbound_reversal_markers() {
        assert!(is_inbound_reversal("TRANSFERÊNCIA RECEBIDA - PIX"));
        assert!(is_inbound_reversal("Pagamento recebido"));
        assert!(!is_inbound_reversal("Transferência enviada"));
    }
}
