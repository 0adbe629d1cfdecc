// client.rs
use crate::config::{Credentials, SourceConfig};
use crate::scraper::models::{RawListing, SearchPage, TokenResponse};
use crate::scraper::FetchError;
use base64::Engine;
use rand::Rng;
use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// A paginated source of raw listings. The ETL treats it as opaque.
pub trait ListingSource {
    /// Fetch one search page (pages start at 1).
    fn search_page(&self, page: u32) -> Result<SearchPage, FetchError>;

    /// Look up listings by property code. Unknown codes yield an empty vec.
    fn lookup(&self, property_code: &str) -> Result<Vec<RawListing>, FetchError>;
}

pub struct IdealistaClient {
    client: Client,
    config: SourceConfig,
    bearer_token: String,
}

impl IdealistaClient {
    /// Builds the HTTP client and exchanges the credentials for a bearer token.
    pub fn connect(config: &SourceConfig, credentials: &Credentials) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let bearer_token = Self::oauth_token(&client, config, credentials)?;
        info!("Obtained OAuth token from {}", config.base_url);

        Ok(Self {
            client,
            config: config.clone(),
            bearer_token,
        })
    }

    fn oauth_token(
        client: &Client,
        config: &SourceConfig,
        credentials: &Credentials,
    ) -> Result<String, FetchError> {
        if credentials.api_key.is_empty() || credentials.secret.is_empty() {
            return Err(FetchError::Credentials("API key or secret is empty".into()));
        }

        let basic = base64::engine::general_purpose::STANDARD
            .encode(format!("{}:{}", credentials.api_key, credentials.secret));

        let resp = client
            .post(format!("{}/oauth/token", config.base_url))
            .header(AUTHORIZATION, format!("Basic {basic}"))
            .header(
                CONTENT_TYPE,
                "application/x-www-form-urlencoded;charset=UTF-8",
            )
            .query(&[("grant_type", "client_credentials")])
            .send()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let text = check_status(resp)?;
        let token: TokenResponse =
            serde_json::from_str(&text).map_err(|e| FetchError::JsonParse(e.to_string()))?;
        Ok(token.access_token)
    }

    fn search(&self, params: &[(&str, String)]) -> Result<SearchPage, FetchError> {
        let resp = self
            .client
            .post(format!("{}/3.5/{}/search", self.config.base_url, self.config.country))
            .bearer_auth(&self.bearer_token)
            .query(params)
            .send()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let text = check_status(resp)?;
        serde_json::from_str(&text).map_err(|e| FetchError::JsonParse(e.to_string()))
    }

    fn base_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("country", self.config.country.clone()),
            ("operation", self.config.operation.clone()),
            ("propertyType", self.config.property_type.clone()),
            ("locationId", self.config.location_id.clone()),
        ]
    }
}

impl ListingSource for IdealistaClient {
    fn search_page(&self, page: u32) -> Result<SearchPage, FetchError> {
        let mut params = self.base_params();
        params.push(("maxItems", self.config.max_items.to_string()));
        params.push(("numPage", page.to_string()));
        self.search(&params)
    }

    fn lookup(&self, property_code: &str) -> Result<Vec<RawListing>, FetchError> {
        let mut params = self.base_params();
        params.push(("adIds", property_code.to_string()));
        Ok(self.search(&params)?.element_list)
    }
}

fn check_status(resp: reqwest::blocking::Response) -> Result<String, FetchError> {
    let status = resp.status();
    let text = resp
        .text()
        .map_err(|e| FetchError::Network(e.to_string()))?;

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(FetchError::Auth(text)),
        s if !s.is_success() => Err(FetchError::Http {
            status: s.as_u16(),
            body: text,
        }),
        _ => Ok(text),
    }
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u64,
    pub max_backoff: Duration,
    pub page_delay: Duration,
}

impl From<&SourceConfig> for RetryPolicy {
    fn from(config: &SourceConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            max_backoff: Duration::from_secs(config.max_backoff_secs),
            page_delay: Duration::from_secs(config.page_delay_secs),
        }
    }
}

impl RetryPolicy {
    /// Capped linear backoff plus up to two seconds of jitter.
    fn backoff(&self, attempt: u64) -> Duration {
        let cap = self.max_backoff.as_secs();
        let base = std::cmp::min(2 * attempt, cap);
        let jitter = rand::thread_rng().gen_range(0..=cap.min(2));
        Duration::from_secs(base + jitter)
    }
}

/// Runs `op` until it succeeds, the attempts run out, or the source rejects
/// our credentials.
pub fn with_retry<T, F>(policy: &RetryPolicy, what: &str, mut op: F) -> Result<T, FetchError>
where
    F: FnMut() -> Result<T, FetchError>,
{
    let mut last_err = None;

    for attempt in 1..=policy.max_attempts {
        let start = Instant::now();

        match op() {
            Ok(value) => return Ok(value),
            Err(e) if e.is_auth() => return Err(e),
            Err(e) => {
                warn!(
                    "{what} attempt {attempt}/{} failed in {:?}: {e}",
                    policy.max_attempts,
                    start.elapsed()
                );
                last_err = Some(e);

                if attempt < policy.max_attempts {
                    std::thread::sleep(policy.backoff(attempt));
                }
            }
        }
    }

    Err(last_err.unwrap_or_else(|| FetchError::Network(format!("{what}: retry loop failed"))))
}

/// Everything one extraction run managed to collect.
#[derive(Debug, Default)]
pub struct Extraction {
    pub records: Vec<RawListing>,
    pub pages_fetched: u32,
    pub total_pages: u32,
    /// Error that cut pagination short, if any.
    pub interrupted_by: Option<String>,
}

impl Extraction {
    pub fn is_complete(&self) -> bool {
        self.interrupted_by.is_none()
    }
}

/// Walks every search page. A failure on the first page is returned as an
/// error; a failure on a later page stops pagination and keeps what was
/// already collected.
pub fn extract_all<S>(source: &S, policy: &RetryPolicy) -> Result<Extraction, FetchError>
where
    S: ListingSource + ?Sized,
{
    let first = with_retry(policy, "page 1", || source.search_page(1))?;

    let mut extraction = Extraction {
        total_pages: first.total_pages.max(1),
        pages_fetched: 1,
        records: first.element_list,
        interrupted_by: None,
    };
    info!(
        "Page 1/{} fetched ({} listings)",
        extraction.total_pages,
        extraction.records.len()
    );

    for page in 2..=extraction.total_pages {
        std::thread::sleep(policy.page_delay);

        match with_retry(policy, &format!("page {page}"), || source.search_page(page)) {
            Ok(result) => {
                info!(
                    "Page {page}/{} fetched ({} listings)",
                    extraction.total_pages,
                    result.element_list.len()
                );
                extraction.records.extend(result.element_list);
                extraction.pages_fetched += 1;
            }
            Err(e) => {
                warn!(
                    "Giving up on page {page} of {}, keeping {} listings: {e}",
                    extraction.total_pages,
                    extraction.records.len()
                );
                extraction.interrupted_by = Some(e.to_string());
                break;
            }
        }
    }

    Ok(extraction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::utils::FakeSource;
    use serde_json::json;
    use std::collections::HashMap;

    fn listing(code: &str) -> RawListing {
        match json!({ "propertyCode": code }) {
            serde_json::Value::Object(map) => RawListing(map),
            _ => unreachable!(),
        }
    }

    fn no_wait(max_attempts: u64) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            max_backoff: Duration::ZERO,
            page_delay: Duration::ZERO,
        }
    }

    #[test]
    fn walks_every_page_including_the_last() {
        let source = FakeSource {
            pages: vec![vec![listing("1")], vec![listing("2")], vec![listing("3")]],
            ..Default::default()
        };

        let extraction = extract_all(&source, &no_wait(3)).unwrap();
        assert!(extraction.is_complete());
        assert_eq!(extraction.pages_fetched, 3);
        assert_eq!(extraction.records.len(), 3);
    }

    #[test]
    fn keeps_accumulated_pages_when_a_later_page_fails() {
        let mut failing: HashMap<u32, fn() -> FetchError> = HashMap::new();
        failing.insert(3, || FetchError::Network("connection reset".into()));

        let source = FakeSource {
            pages: vec![vec![listing("1")], vec![listing("2")], vec![], vec![listing("4")]],
            failing,
            ..Default::default()
        };

        let extraction = extract_all(&source, &no_wait(2)).unwrap();
        assert!(!extraction.is_complete());
        assert_eq!(extraction.pages_fetched, 2);
        assert_eq!(extraction.records, vec![listing("1"), listing("2")]);
        // page 3 retried twice, page 4 never requested
        assert_eq!(*source.calls.borrow(), vec![1, 2, 3, 3]);
    }

    #[test]
    fn auth_errors_are_not_retried() {
        let mut failing: HashMap<u32, fn() -> FetchError> = HashMap::new();
        failing.insert(1, || FetchError::Auth("expired token".into()));

        let source = FakeSource {
            pages: vec![vec![listing("1")]],
            failing,
            ..Default::default()
        };

        let err = extract_all(&source, &no_wait(5)).unwrap_err();
        assert!(err.is_auth());
        assert_eq!(source.calls.borrow().len(), 1);
    }
}
