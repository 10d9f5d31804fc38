use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

/// Placeholder stored when the source sends no description.
pub const MISSING_DESCRIPTION: &str = "Sem descrição";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccountType {
    Bank,
    Credit,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bank => "BANK",
            Self::Credit => "CREDIT",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "BANK" | "CHECKING" => Some(Self::Bank),
            "CREDIT" | "CREDIT_CARD" => Some(Self::Credit),
            _ => None,
        }
    }
}

/// Debit/credit marker as reported by the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    Debit,
    Credit,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debit => "DEBIT",
            Self::Credit => "CREDIT",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "DEBIT" => Some(Self::Debit),
            "CREDIT" => Some(Self::Credit),
            _ => None,
        }
    }

    /// Force the sign implied by the marker. Already-consistent amounts pass through.
    pub fn normalize_amount(&self, amount: f64) -> f64 {
        match self {
            Self::Debit if amount > 0.0 => -amount,
            Self::Credit if amount < 0.0 => -amount,
            _ => amount,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Pluggy,
    Manual,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pluggy => "pluggy",
            Self::Manual => "manual",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pluggy" => Some(Self::Pluggy),
            "manual" => Some(Self::Manual),
            _ => None,
        }
    }
}

macro_rules! sql_text_enum {
    ($ty:ty) => {
        impl ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $ty {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                let raw = value.as_str()?;
                <$ty>::parse(raw).ok_or_else(|| {
                    FromSqlError::Other(format!("unexpected value {raw:?}").into())
                })
            }
        }
    };
}

sql_text_enum!(AccountType);
sql_text_enum!(TransactionType);
sql_text_enum!(Source);

/// Identity of the account a batch belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    pub account_type: AccountType,
    #[serde(default)]
    pub bank_name: String,
    #[serde(default)]
    pub owner_name: String,
}

/// A transaction as delivered by the provider, before normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTransaction {
    #[serde(default)]
    pub id: Option<String>,
    pub date: String,
    pub amount: f64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: TransactionType,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: i64,
    pub provider_id: String,
    pub date: String,
    pub amount: f64,
    pub description: String,
    pub category: String,
    pub source: Source,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub account_id: String,
    pub account_type: AccountType,
    pub bank_name: String,
    pub owner_name: String,
}

impl Transaction {
    /// Column list matching [`Transaction::from_row`], prefixed with the `t` alias.
    pub const COLUMNS: &'static str = "t.id, t.provider_id, t.date, t.amount, t.description, \
         t.category, t.source, t.type, t.account_id, t.account_type, t.bank_name, t.owner_name";

    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            provider_id: row.get(1)?,
            date: row.get(2)?,
            amount: row.get(3)?,
            description: row.get(4)?,
            category: row.get(5)?,
            source: row.get(6)?,
            kind: row.get(7)?,
            account_id: row.get(8)?,
            account_type: row.get(9)?,
            bank_name: row.get(10)?,
            owner_name: row.get(11)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rule {
    pub id: i64,
    pub keyword: String,
    pub category: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub id: i64,
    pub name: String,
    pub client_id: String,
    #[serde(skip_serializing)]
    pub client_secret: String,
    pub created_at: String,
}

/// A provider connection the user saved, with the identity its accounts belong to.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedItem {
    pub id: i64,
    pub item_id: String,
    pub bank_name: String,
    pub owner_name: String,
    pub credential_id: Option<i64>,
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_amount() {
        assert_eq!(TransactionType::Debit.normalize_amount(50.0), -50.0);
        assert_eq!(TransactionType::Credit.normalize_amount(-50.0), 50.0);
        assert_eq!(TransactionType::Debit.normalize_amount(-30.0), -30.0);
        assert_eq!(TransactionType::Credit.normalize_amount(12.5), 12.5);
    }

    #[test]
    fn test_account_type_parse() {
        assert_eq!(AccountType::parse("bank"), Some(AccountType::Bank));
        assert_eq!(AccountType::parse(" CREDIT "), Some(AccountType::Credit));
        assert_eq!(AccountType::parse("all"), None);
    }

    #[test]
    fn test_raw_transaction_deserializes_provider_shape() {
        let raw: RawTransaction = serde_json::from_str(
            r#"{"id": "tx-1", "date": "2024-03-05T10:00:00.000Z", "amount": 12.3, "description": "Padaria", "type": "DEBIT"}"#,
        )
        .unwrap();
        assert_eq!(raw.kind, TransactionType::Debit);
        assert_eq!(raw.id.as_deref(), Some("tx-1"));

        let bare: RawTransaction =
            serde_json::from_str(r#"{"date": "2024-03-05", "amount": 1, "type": "CREDIT"}"#).unwrap();
        assert!(bare.id.is_none());
        assert!(bare.description.is_none());
    }
}
