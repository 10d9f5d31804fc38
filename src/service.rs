use std::path::Path;

use rusqlite::Connection;
use serde::Serialize;

use crate::connections::{find_item, resolve_credential};
use crate::error::{FinboardError, Result};
use crate::models::{AccountInfo, Credential, RawTransaction, SavedItem, Source};
use crate::pluggy::{PluggyClient, Provider, ProviderAccount};
use crate::settings::Settings;
use crate::sync::{sync_transactions, SyncResult};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountFailure {
    pub account_id: String,
    pub error: String,
}

#[derive(Debug, Clone)]
pub struct FetchedAccount {
    pub account: ProviderAccount,
    pub transactions: Vec<RawTransaction>,
}

/// Everything the provider returned for one connection.
#[derive(Debug, Clone)]
pub struct FetchedItem {
    pub item_id: String,
    pub accounts: Vec<FetchedAccount>,
    pub failures: Vec<AccountFailure>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub success: bool,
    pub total_synced: usize,
    pub skipped: usize,
    pub rejected: usize,
    pub failed_accounts: Vec<AccountFailure>,
}

/// Pull accounts and their transactions. Losing the account list fails the
/// whole fetch; losing one account's transactions only records a failure.
pub fn fetch_item(provider: &dyn Provider, item_id: &str) -> Result<FetchedItem> {
    let item_id = item_id.trim();
    if item_id.is_empty() {
        return Err(FinboardError::Validation("itemId must not be empty".to_string()));
    }
    let mut fetched = FetchedItem {
        item_id: item_id.to_string(),
        accounts: Vec::new(),
        failures: Vec::new(),
    };
    for account in provider.fetch_accounts(item_id)? {
        match provider.fetch_transactions(&account.id) {
            Ok(transactions) => fetched.accounts.push(FetchedAccount {
                account,
                transactions,
            }),
            Err(e) => {
                tracing::warn!(item_id, account_id = %account.id, error = %e, "account fetch failed");
                fetched.failures.push(AccountFailure {
                    account_id: account.id,
                    error: e.to_string(),
                });
            }
        }
    }
    Ok(fetched)
}

/// Bank and owner for an account: the saved connection's when the user
/// registered one, else what the provider reports.
pub fn account_identity(saved: Option<&SavedItem>, account: &ProviderAccount) -> AccountInfo {
    match saved {
        Some(item) => AccountInfo {
            account_type: account.account_type,
            bank_name: item.bank_name.clone(),
            owner_name: item.owner_name.clone(),
        },
        None => AccountInfo {
            account_type: account.account_type,
            bank_name: account.name.clone(),
            owner_name: account.owner.clone().unwrap_or_default(),
        },
    }
}

/// Run the sync engine once per fetched account. Each account commits on its
/// own; a storage fault stops the run and is returned.
pub fn store_item(conn: &mut Connection, fetched: &FetchedItem, saved: Option<&SavedItem>) -> Result<SyncReport> {
    let mut totals = SyncResult::default();
    for entry in &fetched.accounts {
        let info = account_identity(saved, &entry.account);
        let result = sync_transactions(conn, &entry.transactions, &entry.account.id, &info, Source::Pluggy)?;
        totals.inserted += result.inserted;
        totals.skipped += result.skipped;
        totals.rejected += result.rejected;
    }
    let report = SyncReport {
        success: fetched.failures.is_empty(),
        total_synced: totals.inserted,
        skipped: totals.skipped,
        rejected: totals.rejected,
        failed_accounts: fetched.failures.clone(),
    };
    tracing::info!(
        item_id = %fetched.item_id,
        synced = report.total_synced,
        skipped = report.skipped,
        failed = report.failed_accounts.len(),
        "item sync finished"
    );
    Ok(report)
}

/// What a provider sync needs from the store before any network call.
#[derive(Debug, Clone)]
pub struct SyncPlan {
    pub credential: Credential,
    pub saved: Option<SavedItem>,
}

/// Resolve the saved connection and the credential to use. An explicit
/// credential id wins over the one stored with the connection.
pub fn plan_sync(conn: &Connection, item_id: &str, credential_id: Option<i64>) -> Result<SyncPlan> {
    let saved = find_item(conn, item_id.trim())?;
    let credential_id = credential_id.or_else(|| saved.as_ref().and_then(|s| s.credential_id));
    let credential = resolve_credential(conn, credential_id)?;
    Ok(SyncPlan { credential, saved })
}

/// Fetch one provider connection and store everything it returned.
pub fn sync_item(
    conn: &mut Connection,
    settings: &Settings,
    item_id: &str,
    credential_id: Option<i64>,
) -> Result<SyncReport> {
    let plan = plan_sync(conn, item_id, credential_id)?;
    let client = PluggyClient::from_settings(settings, &plan.credential)?;
    let fetched = fetch_item(&client, item_id)?;
    store_item(conn, &fetched, plan.saved.as_ref())
}

/// Load a JSON array of raw transactions from disk and sync it as manual entries.
pub fn import_file(conn: &mut Connection, path: &Path, account_id: &str, info: &AccountInfo) -> Result<SyncResult> {
    if !path.exists() {
        return Err(FinboardError::NotFound(format!("file {}", path.display())));
    }
    let content = std::fs::read_to_string(path)?;
    let raw: Vec<RawTransaction> = serde_json::from_str(&content)?;
    sync_transactions(conn, &raw, account_id, info, Source::Manual)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::db::test_db;
    use crate::models::{AccountType, TransactionType};

    #[derive(Default)]
    struct FakeProvider {
        accounts: Vec<ProviderAccount>,
        transactions: HashMap<String, Vec<RawTransaction>>,
        broken_accounts: Vec<String>,
        accounts_down: bool,
    }

    impl Provider for FakeProvider {
        fn fetch_accounts(&self, _item_id: &str) -> Result<Vec<ProviderAccount>> {
            if self.accounts_down {
                return Err(FinboardError::provider(Some(503), "unavailable"));
            }
            Ok(self.accounts.clone())
        }

        fn fetch_transactions(&self, account_id: &str) -> Result<Vec<RawTransaction>> {
            if self.broken_accounts.iter().any(|a| a == account_id) {
                return Err(FinboardError::provider(None, "pagination stuck"));
            }
            Ok(self.transactions.get(account_id).cloned().unwrap_or_default())
        }
    }

    fn account(id: &str, account_type: AccountType) -> ProviderAccount {
        ProviderAccount {
            id: id.to_string(),
            account_type,
            name: "Nubank".to_string(),
            owner: Some("Ana Souza".to_string()),
        }
    }

    fn raw(id: &str, date: &str, amount: f64) -> RawTransaction {
        RawTransaction {
            id: Some(id.to_string()),
            date: date.to_string(),
            amount,
            description: Some(format!("Compra {id}")),
            kind: TransactionType::Debit,
        }
    }

    fn provider() -> FakeProvider {
        let mut p = FakeProvider {
            accounts: vec![account("chk", AccountType::Bank), account("card", AccountType::Credit)],
            ..FakeProvider::default()
        };
        p.transactions.insert("chk".to_string(), vec![raw("a", "2024-03-01", 10.0), raw("b", "2024-03-02", 20.0)]);
        p.transactions.insert("card".to_string(), vec![raw("c", "2024-03-03", 30.0), raw("d", "not a date", 1.0)]);
        p
    }

    #[test]
    fn test_sync_all_accounts() {
        let (_dir, mut conn) = test_db();
        let fetched = fetch_item(&provider(), "item-1").unwrap();
        let report = store_item(&mut conn, &fetched, None).unwrap();
        assert!(report.success);
        assert_eq!(report.total_synced, 3);
        assert_eq!(report.rejected, 1);

        let again = store_item(&mut conn, &fetched, None).unwrap();
        assert_eq!(again.total_synced, 0);
        assert_eq!(again.skipped, 3);
    }

    #[test]
    fn test_partial_failure_keeps_other_accounts() {
        let (_dir, mut conn) = test_db();
        let mut p = provider();
        p.broken_accounts.push("card".to_string());
        let fetched = fetch_item(&p, "item-1").unwrap();
        let report = store_item(&mut conn, &fetched, None).unwrap();
        assert!(!report.success);
        assert_eq!(report.total_synced, 2);
        assert_eq!(report.failed_accounts.len(), 1);
        assert_eq!(report.failed_accounts[0].account_id, "card");
    }

    #[test]
    fn test_account_list_failure_is_fatal() {
        let p = FakeProvider {
            accounts_down: true,
            ..FakeProvider::default()
        };
        assert!(matches!(fetch_item(&p, "item-1"), Err(FinboardError::Provider { .. })));
        assert!(matches!(fetch_item(&provider(), " "), Err(FinboardError::Validation(_))));
    }

    #[test]
    fn test_saved_item_identity_wins() {
        let (_dir, mut conn) = test_db();
        let saved = SavedItem {
            id: 1,
            item_id: "item-1".to_string(),
            bank_name: "Nubank PF".to_string(),
            owner_name: "Ana".to_string(),
            credential_id: None,
            created_at: String::new(),
        };
        let fetched = fetch_item(&provider(), "item-1").unwrap();
        store_item(&mut conn, &fetched, Some(&saved)).unwrap();
        let owners: Vec<String> = conn
            .prepare("SELECT DISTINCT owner_name FROM transactions")
            .unwrap()
            .query_map([], |r| r.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(owners, vec!["Ana".to_string()]);
    }

    #[test]
    fn test_identity_falls_back_to_account() {
        let info = account_identity(None, &account("chk", AccountType::Bank));
        assert_eq!(info.bank_name, "Nubank");
        assert_eq!(info.owner_name, "Ana Souza");
        let mut anonymous = account("card", AccountType::Credit);
        anonymous.owner = None;
        assert_eq!(account_identity(None, &anonymous).owner_name, "");
    }

    #[test]
    fn test_sync_report_json_shape() {
        let report = SyncReport {
            success: true,
            total_synced: 2,
            skipped: 0,
            rejected: 0,
            failed_accounts: Vec::new(),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["totalSynced"], 2);
    }

    #[test]
    fn test_plan_sync_prefers_explicit_credential() {
        use crate::connections::{create_credential, create_item, CredentialInput, SavedItemInput};
        let (_dir, conn) = test_db();
        let input = |name: &str| CredentialInput {
            name: name.to_string(),
            client_id: format!("{name}-id"),
            client_secret: "secret".to_string(),
        };
        let a = create_credential(&conn, &input("a")).unwrap();
        let b = create_credential(&conn, &input("b")).unwrap();
        create_item(
            &conn,
            &SavedItemInput {
                item_id: "item-1".to_string(),
                bank_name: "Nubank".to_string(),
                owner_name: "Ana".to_string(),
                credential_id: Some(a.id),
            },
        )
        .unwrap();

        let plan = plan_sync(&conn, "item-1", None).unwrap();
        assert_eq!(plan.credential.id, a.id);
        assert_eq!(plan.saved.unwrap().owner_name, "Ana");
        assert_eq!(plan_sync(&conn, "item-1", Some(b.id)).unwrap().credential.id, b.id);
        // Unknown item with two credentials and no choice is ambiguous.
        assert!(matches!(plan_sync(&conn, "item-2", None), Err(FinboardError::Validation(_))));
    }

    #[test]
    fn test_import_file_as_manual() {
        let (dir, mut conn) = test_db();
        let path = dir.path().join("extrato.json");
        std::fs::write(
            &path,
            r#"[{"date": "2024-03-05", "amount": 35.5, "description": "Feira livre", "type": "DEBIT"},
                {"date": "2024-03-06", "amount": 100, "type": "CREDIT"}]"#,
        )
        .unwrap();
        let info = AccountInfo {
            account_type: AccountType::Bank,
            bank_name: "Caixa".to_string(),
            owner_name: "Ana".to_string(),
        };
        let result = import_file(&mut conn, &path, "wallet", &info).unwrap();
        assert_eq!(result.inserted, 2);
        let source: String = conn
            .query_row("SELECT DISTINCT source FROM transactions", [], |r| r.get(0))
            .unwrap();
        assert_eq!(source, "manual");

        let missing = import_file(&mut conn, &dir.path().join("nope.json"), "wallet", &info);
        assert!(matches!(missing, Err(FinboardError::NotFound(_))));
    }
}
