use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

use serde::Deserialize;
use serde_json::Value;
use zeroize::Zeroizing;

use crate::error::{FinboardError, Result};
use crate::models::{AccountType, Credential, RawTransaction};
use crate::settings::Settings;

const MAX_RETRIES: u32 = 3;
const MAX_RETRY_WAIT: Duration = Duration::from_secs(60);
const USER_AGENT: &str = concat!("finboard/", env!("CARGO_PKG_VERSION"));
// Keys live two hours upstream; renew before that.
const API_KEY_TTL: Duration = Duration::from_secs(110 * 60);

/// An account under a provider connection.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderAccount {
    pub id: String,
    pub account_type: AccountType,
    pub name: String,
    pub owner: Option<String>,
}

/// Source of accounts and their complete transaction history. Implementations
/// own authentication and pagination.
pub trait Provider {
    fn fetch_accounts(&self, item_id: &str) -> Result<Vec<ProviderAccount>>;
    fn fetch_transactions(&self, account_id: &str) -> Result<Vec<RawTransaction>>;
}

#[derive(Debug, Deserialize)]
struct AccountEntry {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    owner: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Page {
    #[serde(default)]
    total_pages: u32,
    #[serde(default)]
    results: Vec<Value>,
}

struct ApiKey {
    value: Zeroizing<String>,
    issued_at: Instant,
}

pub struct PluggyClient {
    http: reqwest::blocking::Client,
    base_url: String,
    client_id: String,
    client_secret: Zeroizing<String>,
    page_size: u32,
    max_pages: u32,
    backoff: Duration,
    api_key: Mutex<Option<ApiKey>>,
}

/// Wait before the next attempt: the server's `Retry-After` seconds when it
/// sends a usable one, else the current backoff. Never more than a minute.
fn retry_wait(retry_after: Option<&str>, backoff: Duration) -> Duration {
    retry_after
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(backoff)
        .min(MAX_RETRY_WAIT)
}

fn error_message(body: &Value, status: u16) -> String {
    body["message"]
        .as_str()
        .or_else(|| body["error"].as_str())
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {status}"))
}

impl PluggyClient {
    pub fn new(base_url: &str, client_id: &str, client_secret: &str) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            client_id: client_id.to_string(),
            client_secret: Zeroizing::new(client_secret.to_string()),
            page_size: 500,
            max_pages: 50,
            backoff: Duration::from_secs(1),
            api_key: Mutex::new(None),
        })
    }

    pub fn from_settings(settings: &Settings, credential: &Credential) -> Result<Self> {
        Ok(Self::new(
            &settings.pluggy_base_url,
            &credential.client_id,
            &credential.client_secret,
        )?
        .with_paging(settings.pluggy_page_size, settings.pluggy_max_pages))
    }

    pub fn with_paging(mut self, page_size: u32, max_pages: u32) -> Self {
        self.page_size = page_size.max(1);
        self.max_pages = max_pages.max(1);
        self
    }

    #[cfg(test)]
    fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Send with retry and exponential backoff on 429, 5xx and transport
    /// errors. Other 4xx responses fail on the first attempt.
    fn send_with_retry(
        &self,
        build_request: impl Fn(&reqwest::blocking::Client) -> reqwest::blocking::RequestBuilder,
    ) -> Result<Value> {
        let mut backoff = self.backoff;
        let mut attempt = 0;
        loop {
            match build_request(&self.http).send() {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    if status == 429 || status >= 500 {
                        if attempt == MAX_RETRIES {
                            let what = if status == 429 { "rate limited" } else { "upstream error" };
                            return Err(FinboardError::provider(
                                Some(status),
                                format!("{what} after {MAX_RETRIES} retries"),
                            ));
                        }
                        let retry_after = resp.headers().get("retry-after").and_then(|v| v.to_str().ok());
                        let wait = retry_wait(retry_after, backoff);
                        tracing::warn!(status, attempt = attempt + 1, wait_ms = wait.as_millis() as u64, "retrying provider request");
                        thread::sleep(wait);
                        backoff *= 2;
                        attempt += 1;
                        continue;
                    }
                    if status >= 400 {
                        let body: Value = resp.json().unwrap_or(Value::Null);
                        return Err(FinboardError::provider(Some(status), error_message(&body, status)));
                    }
                    return Ok(resp.json()?);
                }
                Err(e) => {
                    if attempt == MAX_RETRIES {
                        return Err(FinboardError::provider(
                            None,
                            format!("unreachable after {MAX_RETRIES} retries: {e}"),
                        ));
                    }
                    tracing::warn!(attempt = attempt + 1, error = %e, "retrying provider request");
                    thread::sleep(backoff);
                    backoff *= 2;
                    attempt += 1;
                }
            }
        }
    }

    fn authenticate(&self) -> Result<Zeroizing<String>> {
        let url = format!("{}/auth", self.base_url);
        let payload = serde_json::json!({
            "clientId": self.client_id,
            "clientSecret": self.client_secret.as_str(),
        });
        let body = self.send_with_retry(|http| http.post(&url).json(&payload))?;
        let key = body["apiKey"]
            .as_str()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| FinboardError::provider(None, "auth response missing apiKey"))?;
        tracing::debug!("obtained provider api key");
        Ok(Zeroizing::new(key.to_string()))
    }

    fn current_key(&self, force_refresh: bool) -> Result<Zeroizing<String>> {
        let mut cached = self
            .api_key
            .lock()
            .map_err(|_| FinboardError::Other("api key cache poisoned".to_string()))?;
        if !force_refresh {
            if let Some(key) = cached.as_ref().filter(|k| k.issued_at.elapsed() < API_KEY_TTL) {
                return Ok(key.value.clone());
            }
        }
        let value = self.authenticate()?;
        *cached = Some(ApiKey {
            value: value.clone(),
            issued_at: Instant::now(),
        });
        Ok(value)
    }

    /// Authenticated GET. A 401 forces one key renewal and a single replay.
    fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        let key = self.current_key(false)?;
        let result = self.send_with_retry(|http| {
            http.get(&url).header("X-API-KEY", key.as_str()).query(query)
        });
        match result {
            Err(FinboardError::Provider { status: Some(401), .. }) => {
                tracing::info!(path, "api key rejected, re-authenticating");
                let key = self.current_key(true)?;
                self.send_with_retry(|http| {
                    http.get(&url).header("X-API-KEY", key.as_str()).query(query)
                })
            }
            other => other,
        }
    }

    #[cfg(test)]
    fn seed_api_key(&self, value: &str) {
        *self.api_key.lock().unwrap() = Some(ApiKey {
            value: Zeroizing::new(value.to_string()),
            issued_at: Instant::now(),
        });
    }
}

impl Provider for PluggyClient {
    fn fetch_accounts(&self, item_id: &str) -> Result<Vec<ProviderAccount>> {
        let body = self.get("/accounts", &[("itemId", item_id.to_string())])?;
        let page: Page = serde_json::from_value(body)?;
        let mut accounts = Vec::new();
        for value in page.results {
            let entry: AccountEntry = serde_json::from_value(value)?;
            let Some(account_type) = AccountType::parse(&entry.kind) else {
                tracing::debug!(account_id = %entry.id, kind = %entry.kind, "skipping unsupported account type");
                continue;
            };
            accounts.push(ProviderAccount {
                id: entry.id,
                account_type,
                name: entry.name,
                owner: entry.owner.filter(|o| !o.trim().is_empty()),
            });
        }
        tracing::info!(item_id, accounts = accounts.len(), "fetched accounts");
        Ok(accounts)
    }

    /// Every transaction for the account, following pages until the last
    /// one, an empty page, or the page cap.
    fn fetch_transactions(&self, account_id: &str) -> Result<Vec<RawTransaction>> {
        let mut all = Vec::new();
        let mut prev_first_id: Option<String> = None;
        let mut page_no = 1u32;

        loop {
            if page_no > self.max_pages {
                tracing::warn!(account_id, max_pages = self.max_pages, "page cap reached, stopping");
                break;
            }
            let body = self.get(
                "/transactions",
                &[
                    ("accountId", account_id.to_string()),
                    ("page", page_no.to_string()),
                    ("pageSize", self.page_size.to_string()),
                ],
            )?;
            let page: Page = serde_json::from_value(body)?;
            if page.results.is_empty() {
                break;
            }

            let first_id = page.results[0]["id"].as_str().map(str::to_string);
            if first_id.is_some() && first_id == prev_first_id {
                return Err(FinboardError::provider(
                    None,
                    format!("pagination stuck: page {page_no} repeats the previous page"),
                ));
            }
            prev_first_id = first_id;

            tracing::debug!(account_id, page = page_no, total_pages = page.total_pages, count = page.results.len(), "fetched page");
            for value in page.results {
                match serde_json::from_value::<RawTransaction>(value) {
                    Ok(txn) => all.push(txn),
                    Err(e) => tracing::warn!(account_id, error = %e, "skipping malformed transaction"),
                }
            }

            if page_no >= page.total_pages {
                break;
            }
            page_no += 1;
        }

        tracing::info!(account_id, transactions = all.len(), "fetched transactions");
        Ok(all)
    }
}
