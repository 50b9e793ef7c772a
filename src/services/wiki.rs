use rand::{thread_rng, Rng};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use std::thread;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};
use crate::model::config::FetchConfig;

const BASE_DELAY_MS: u64 = 800;

/// One page of a category listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberPage {
    pub titles: Vec<String>,
    /// Continuation token; `None` on the last page.
    pub next: Option<String>,
}

/// Where the fetcher gets category listings and page markup from.
pub trait WikiSource {
    fn category_members(
        &mut self,
        category: &str,
        cont: Option<&str>,
        limit: u32,
    ) -> Result<MemberPage>;

    fn page_wikitext(&mut self, title: &str) -> Result<String>;
}

/* ---------------- MediaWiki API responses (formatversion=2) ---------------- */

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: String,
    #[serde(default)]
    info: String,
}

#[derive(Debug, Deserialize)]
struct CategoryResponse {
    #[serde(default)]
    query: Option<CategoryQuery>,
    #[serde(rename = "continue", default)]
    cont: Option<CategoryContinue>,
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct CategoryQuery {
    #[serde(default)]
    categorymembers: Vec<CategoryMember>,
}

#[derive(Debug, Deserialize)]
struct CategoryMember {
    title: String,
    #[serde(default)]
    ns: i64,
}

#[derive(Debug, Deserialize)]
struct CategoryContinue {
    cmcontinue: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ParseResponse {
    #[serde(default)]
    parse: Option<ParsedPage>,
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ParsedPage {
    #[serde(default)]
    wikitext: String,
}

fn api_error(body: Option<ApiErrorBody>) -> Option<Error> {
    body.map(|e| Error::Api {
        code: e.code,
        info: e.info,
    })
}

/* ---------------- Blocking HTTP client ---------------- */

/// Sequential MediaWiki client: one request at a time, a fixed pause between
/// requests, bounded retries on transient failures.
pub struct WikiClient {
    client: Client,
    api_url: String,
    delay: Duration,
    max_retries: usize,
    last_request: Option<Instant>,
}

impl WikiClient {
    pub fn new(cfg: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .user_agent(cfg.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            api_url: cfg.api_url.clone(),
            delay: Duration::from_millis(cfg.request_delay_ms),
            max_retries: cfg.max_retries,
            last_request: None,
        })
    }

    fn throttle(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.delay {
                thread::sleep(self.delay - elapsed);
            }
        }
        self.last_request = Some(Instant::now());
    }

    fn get_json<T: DeserializeOwned>(&mut self, params: &[(&str, &str)]) -> Result<T> {
        let mut attempt = 0usize;

        loop {
            self.throttle();

            let res = self.client.get(&self.api_url).query(params).send();

            let err = match res {
                Ok(resp) => {
                    let status = resp.status();
                    match resp.text() {
                        Ok(text) if status.is_success() => {
                            return serde_json::from_str(&text).map_err(Error::from);
                        }
                        Ok(_) => {
                            let err = Error::Status {
                                status: status.as_u16(),
                                url: self.api_url.clone(),
                            };
                            if !should_retry_http(status) {
                                return Err(err);
                            }
                            err
                        }
                        Err(e) => Error::Http(e),
                    }
                }
                Err(e) => Error::Http(e),
            };

            if attempt >= self.max_retries {
                return Err(err);
            }

            let wait = backoff(attempt);
            warn!(attempt = attempt + 1, error = %err, wait_ms = wait.as_millis() as u64, "request failed, retrying");
            thread::sleep(wait);
            attempt += 1;
        }
    }
}

impl WikiSource for WikiClient {
    fn category_members(
        &mut self,
        category: &str,
        cont: Option<&str>,
        limit: u32,
    ) -> Result<MemberPage> {
        let limit = limit.to_string();
        let mut params = vec![
            ("action", "query"),
            ("list", "categorymembers"),
            ("cmtitle", category),
            ("cmnamespace", "0"),
            ("cmtype", "page"),
            ("cmlimit", limit.as_str()),
            ("format", "json"),
            ("formatversion", "2"),
        ];
        if let Some(c) = cont {
            params.push(("cmcontinue", c));
        }

        let resp: CategoryResponse = self.get_json(&params)?;
        if let Some(err) = api_error(resp.error) {
            return Err(err);
        }

        let titles: Vec<String> = resp
            .query
            .map(|q| q.categorymembers)
            .unwrap_or_default()
            .into_iter()
            .filter(|m| m.ns == 0)
            .map(|m| m.title)
            .collect();

        let next = resp.cont.and_then(|c| c.cmcontinue);
        debug!(category, count = titles.len(), more = next.is_some(), "category page listed");

        Ok(MemberPage { titles, next })
    }

    fn page_wikitext(&mut self, title: &str) -> Result<String> {
        let params = [
            ("action", "parse"),
            ("page", title),
            ("prop", "wikitext"),
            ("redirects", "1"),
            ("format", "json"),
            ("formatversion", "2"),
        ];

        let resp: ParseResponse = self.get_json(&params)?;
        if let Some(err) = api_error(resp.error) {
            return Err(err);
        }

        resp.parse.map(|p| p.wikitext).ok_or_else(|| Error::Api {
            code: "noparse".into(),
            info: format!("no parse result for '{title}'"),
        })
    }
}

fn backoff(attempt: usize) -> Duration {
    let jitter: u64 = thread_rng().gen_range(0..200);
    let ms = BASE_DELAY_MS * (2_u64.pow(attempt as u32)) + jitter;
    Duration::from_millis(ms)
}

fn should_retry_http(status: StatusCode) -> bool {
    // 408/429/5xx are usually temporary
    status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
        || status.is_server_error()
}
