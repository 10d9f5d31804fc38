use chrono::{Datelike, NaiveDate, Weekday};
use regex::Regex;
use rusqlite::Connection;

use crate::error::Result;
use crate::models::Rule;

pub const DEFAULT_CATEGORY: &str = "Outros";
pub const INFORMAL_MARKET_CATEGORY: &str = "Feira";
const PERSONAL_NAME_PATTERN: &str = r"^\p{Lu}\p{Ll}\S{4,27}$";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Polarity {
    Any,
    Inflow,
    Outflow,
}

impl Polarity {
    fn admits(&self, amount: f64) -> bool {
        match self {
            Self::Any => true,
            Self::Inflow => amount > 0.0,
            Self::Outflow => amount < 0.0,
        }
    }
}

struct Bucket {
    category: &'static str,
    polarity: Polarity,
    keywords: &'static [&'static str],
}

// Merchants that must beat a broader bucket they lexically overlap with.
const OVERRIDES: &[(&str, &str)] = &[
    ("mercado livre", "Compras"),
    ("mercadolivre", "Compras"),
    ("mercado pago", "Compras"),
    ("uber eats", "Alimentação"),
    ("amazon prime", "Assinaturas"),
];

// Order is precedence: the first bucket with a matching keyword wins.
const BUCKETS: &[Bucket] = &[
    Bucket {
        category: "Salário",
        polarity: Polarity::Inflow,
        keywords: &["salário", "salario", "folha de pagamento", "proventos"],
    },
    Bucket {
        category: "Rendimentos",
        polarity: Polarity::Inflow,
        keywords: &["rendimento", "juros", "dividendo", "resgate"],
    },
    Bucket {
        category: "Pagamento de Fatura",
        polarity: Polarity::Any,
        keywords: &["pagamento de fatura", "pagamento fatura", "pgto fatura"],
    },
    Bucket {
        category: "Assinaturas",
        polarity: Polarity::Outflow,
        keywords: &["netflix", "spotify", "disney", "hbo", "youtube", "apple.com", "google storage"],
    },
    Bucket {
        category: "Compras",
        polarity: Polarity::Any,
        keywords: &["compra", "amazon", "shopee", "magalu", "magazine luiza", "aliexpress", "americanas", "shein"],
    },
    Bucket {
        category: "Supermercado",
        polarity: Polarity::Outflow,
        keywords: &["mercado", "supermercado", "atacadão", "atacadao", "assai", "carrefour", "pão de açúcar", "hortifruti"],
    },
    Bucket {
        category: "Alimentação",
        polarity: Polarity::Outflow,
        keywords: &["ifood", "restaurante", "lanchonete", "padaria", "pizzaria", "burger", "café", "cafeteria"],
    },
    Bucket {
        category: "Transporte",
        polarity: Polarity::Outflow,
        keywords: &["uber", "99app", "99 pop", "posto", "combustível", "combustivel", "estacionamento", "pedágio", "sem parar"],
    },
    Bucket {
        category: "Saúde",
        polarity: Polarity::Outflow,
        keywords: &["farmácia", "farmacia", "drogaria", "drogasil", "raia", "hospital", "clínica", "clinica", "laboratório", "unimed"],
    },
    Bucket {
        category: "Moradia",
        polarity: Polarity::Outflow,
        keywords: &["aluguel", "condomínio", "condominio", "energia", "enel", "cemig", "sabesp", "copasa"],
    },
    Bucket {
        category: "Educação",
        polarity: Polarity::Outflow,
        keywords: &["escola", "faculdade", "curso", "udemy", "alura", "livraria"],
    },
    Bucket {
        category: "Lazer",
        polarity: Polarity::Outflow,
        keywords: &["cinema", "ingresso", "steam", "airbnb", "hotel", "viagem"],
    },
    Bucket {
        category: "Impostos e Taxas",
        polarity: Polarity::Outflow,
        keywords: &["iof", "tarifa", "anuidade", "imposto", "iptu", "ipva", "darf"],
    },
    Bucket {
        category: "Transferências",
        polarity: Polarity::Any,
        keywords: &["transferência", "transferencia", "pix", "ted ", "doc "],
    },
];

/// Ordered keyword classifier over a snapshot of the rule store.
pub struct Categorizer {
    rules: Vec<Rule>,
    personal_name: Regex,
}

impl Categorizer {
    pub fn new(rules: Vec<Rule>) -> Result<Self> {
        // One uppercase letter, one lowercase letter, then 4..=27 more
        // non-space characters: a single capitalized word of 6..=29 chars.
        let personal_name = Regex::new(PERSONAL_NAME_PATTERN)?;
        Ok(Self {
            rules,
            personal_name,
        })
    }

    pub fn load(conn: &Connection) -> Result<Self> {
        Self::new(load_rules(conn)?)
    }

    /// Total: always yields a category, falling back to [`DEFAULT_CATEGORY`].
    pub fn classify(&self, description: &str, amount: f64, date: Option<NaiveDate>) -> String {
        let desc = description.to_lowercase();

        if let Some((_, category)) = OVERRIDES.iter().find(|(kw, _)| desc.contains(kw)) {
            return category.to_string();
        }

        for bucket in BUCKETS {
            if bucket.polarity.admits(amount) && bucket.keywords.iter().any(|kw| desc.contains(kw)) {
                return bucket.category.to_string();
            }
        }

        if let Some(rule) = self
            .rules
            .iter()
            .find(|r| !r.keyword.is_empty() && desc.contains(&r.keyword.to_lowercase()))
        {
            return rule.category.clone();
        }

        if amount < 0.0
            && date.is_some_and(|d| d.weekday() == Weekday::Sun)
            && self.personal_name.is_match(description.trim())
        {
            return INFORMAL_MARKET_CATEGORY.to_string();
        }

        DEFAULT_CATEGORY.to_string()
    }
}

pub fn load_rules(conn: &Connection) -> Result<Vec<Rule>> {
    let mut stmt = conn.prepare("SELECT id, keyword, category FROM rules ORDER BY keyword")?;
    let rules = stmt
        .query_map([], |row| {
            Ok(Rule {
                id: row.get(0)?,
                keyword: row.get(1)?,
                category: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rules)
}

/// Insert or replace the category for a keyword. Keywords are stored lower-cased.
pub fn upsert_rule(conn: &Connection, keyword: &str, category: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO rules (keyword, category) VALUES (?1, ?2) \
         ON CONFLICT(keyword) DO UPDATE SET category = excluded.category, updated_at = datetime('now')",
        rusqlite::params![keyword.trim().to_lowercase(), category],
    )?;
    Ok(())
}

pub fn delete_rule(conn: &Connection, keyword: &str) -> Result<bool> {
    let n = conn.execute(
        "DELETE FROM rules WHERE keyword = ?1",
        [keyword.trim().to_lowercase()],
    )?;
    Ok(n > 0)
}

/// Rule keyword learned from a description: its first word, lower-cased.
pub fn rule_keyword(description: &str) -> Option<String> {
    description
        .split_whitespace()
        .next()
        .map(|w| w.to_lowercase())
}
