//! npm registry probe for package existence, downloads and freshness.

use crate::registry::RegistryProbe;
use crate::types::{HttpConfig, PackageStats, ProbeStatus, Result};
use chrono::{DateTime, Utc};
use governor::{Quota, RateLimiter};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Hard ceiling on names per comma-joined downloads call; the bulk API
/// rejects longer URLs and throttles harder.
pub const MAX_BATCH: usize = 128;

/// Fixed pause after an HTTP 429 before the next attempt.
const RATE_LIMIT_BACKOFF: Duration = Duration::from_secs(10);

/// Reserved by the bulk downloads API as date-range metadata keys.
const RESERVED_BATCH_NAMES: &[&str] = &["start", "end"];

/// Whether a name can ride a comma-joined batch call. Scoped names and the
/// reserved metadata keys must be probed individually.
pub fn batchable(name: &str) -> bool {
    !name.starts_with('@') && !RESERVED_BATCH_NAMES.contains(&name)
}

/// Downloads API point payload for a single package.
#[derive(Debug, Deserialize)]
struct DownloadPoint {
    downloads: u64,
}

/// Registry metadata payload; only the modification timestamp is read.
#[derive(Debug, Deserialize)]
struct PackageMeta {
    time: PackageTimes,
}

#[derive(Debug, Deserialize)]
struct PackageTimes {
    modified: DateTime<Utc>,
}

/// Probe for the npm registry and its downloads API.
pub struct NpmProbe {
    client: Client,
    rate_limiter: RateLimiter<governor::state::NotKeyed, governor::state::InMemoryState, governor::clock::DefaultClock>,
    registry_url: String,
    api_url: String,
    max_retries: u32,
}

impl NpmProbe {
    /// Create a new probe against the given registry and downloads hosts.
    pub fn new(http: HttpConfig, rate_limit: u32, registry_url: String, api_url: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(http.timeout_secs))
            .user_agent(&http.user_agent)
            .http1_only() // Force HTTP/1.1 to avoid HTTP/2 stream limit issues
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()?;

        let quota = Quota::per_second(NonZeroU32::new(rate_limit).unwrap_or(NonZeroU32::new(5).unwrap()));

        Ok(Self {
            client,
            rate_limiter: RateLimiter::direct(quota),
            registry_url: registry_url.trim_end_matches('/').to_string(),
            api_url: api_url.trim_end_matches('/').to_string(),
            max_retries: http.max_retries,
        })
    }

    /// GET a URL, waiting out 429s with the fixed backoff up to the retry
    /// bound. `None` means no attempt produced a response.
    async fn get_with_backoff(&self, url: &str) -> Option<Response> {
        for attempt in 0..=self.max_retries {
            self.rate_limiter.until_ready().await;
            match self.client.get(url).send().await {
                Ok(response) if response.status() == StatusCode::TOO_MANY_REQUESTS => {
                    debug!(
                        "Rate limited on {} (attempt {}/{}), backing off {}s",
                        url,
                        attempt + 1,
                        self.max_retries + 1,
                        RATE_LIMIT_BACKOFF.as_secs()
                    );
                    tokio::time::sleep(RATE_LIMIT_BACKOFF).await;
                }
                Ok(response) => {
                    trace!("GET {} -> {}", url, response.status());
                    return Some(response);
                }
                Err(e) => {
                    warn!("Request to {} failed: {}", url, e);
                    return None;
                }
            }
        }
        warn!("Rate limit retries exhausted for {}", url);
        None
    }

    /// Single-package downloads point. `None` when the call yields no data.
    async fn downloads_point(&self, period: &str, name: &str) -> Option<u64> {
        let url = format!(
            "{}/downloads/point/{}/{}",
            self.api_url,
            period,
            urlencoding::encode(name)
        );
        let response = self.get_with_backoff(&url).await?;
        if !response.status().is_success() {
            debug!("Downloads fetch for {} returned {}", name, response.status());
            return None;
        }
        match response.json::<DownloadPoint>().await {
            Ok(point) => Some(point.downloads),
            Err(e) => {
                warn!("Malformed downloads payload for {}: {}", name, e);
                None
            }
        }
    }

    /// Comma-joined downloads call, shared by the existence and per-metric
    /// batch paths. `None` when the call itself failed.
    async fn downloads_batch(&self, period: &str, names: &[String]) -> Option<Value> {
        let joined = names
            .iter()
            .map(|n| urlencoding::encode(n).into_owned())
            .collect::<Vec<_>>()
            .join(",");
        let url = format!("{}/downloads/point/{}/{}", self.api_url, period, joined);
        let response = self.get_with_backoff(&url).await?;
        if !response.status().is_success() {
            debug!(
                "Batch downloads call for {} names returned {}",
                names.len(),
                response.status()
            );
            return None;
        }
        match response.json::<Value>().await {
            Ok(payload) => Some(payload),
            Err(e) => {
                warn!("Malformed batch downloads payload: {}", e);
                None
            }
        }
    }
}

impl RegistryProbe for NpmProbe {
    async fn probe(&self, name: &str) -> ProbeStatus {
        let url = format!("{}/{}", self.registry_url, urlencoding::encode(name));
        let response = match self.get_with_backoff(&url).await {
            Some(r) => r,
            None => return ProbeStatus::Unavailable,
        };
        if response.status() == StatusCode::NOT_FOUND {
            debug!("Package not in registry: {}", name);
            return ProbeStatus::Absent;
        }
        if !response.status().is_success() {
            debug!("Metadata fetch for {} returned {}", name, response.status());
            return ProbeStatus::Unavailable;
        }
        let meta: PackageMeta = match response.json().await {
            Ok(meta) => meta,
            Err(e) => {
                warn!("Malformed metadata for {}: {}", name, e);
                return ProbeStatus::Unavailable;
            }
        };

        let weekly = self.downloads_point("last-week", name).await;
        let monthly = self.downloads_point("last-month", name).await;
        match (weekly, monthly) {
            (Some(weekly_downloads), Some(monthly_downloads)) => {
                ProbeStatus::Exists(PackageStats {
                    weekly_downloads,
                    monthly_downloads,
                    last_update: meta.time.modified,
                })
            }
            // The package page exists but its downloads cannot be read;
            // without counts no scoring is possible.
            _ => ProbeStatus::Unavailable,
        }
    }

    async fn probe_batch(&self, names: &[String]) -> HashMap<String, bool> {
        if names.is_empty() {
            return HashMap::new();
        }
        // A lone unknown name gets a 404 from the point endpoint instead of
        // the null-mapping shape, so route it through the metadata probe.
        if names.len() == 1 {
            let mut out = HashMap::new();
            match self.probe(&names[0]).await {
                ProbeStatus::Exists(_) => {
                    out.insert(names[0].clone(), true);
                }
                ProbeStatus::Absent => {
                    out.insert(names[0].clone(), false);
                }
                ProbeStatus::Unavailable => {}
            }
            return out;
        }
        match self.downloads_batch("last-week", names).await {
            Some(payload) => parse_batch_existence(&payload, names),
            None => HashMap::new(),
        }
    }

    async fn batch_weekly(&self, names: &[String]) -> HashMap<String, u64> {
        match self.downloads_batch("last-week", names).await {
            Some(payload) => parse_batch_downloads(&payload, names),
            None => HashMap::new(),
        }
    }

    async fn batch_monthly(&self, names: &[String]) -> HashMap<String, u64> {
        match self.downloads_batch("last-month", names).await {
            Some(payload) => parse_batch_downloads(&payload, names),
            None => HashMap::new(),
        }
    }

    async fn batch_last_update(&self, names: &[String]) -> HashMap<String, DateTime<Utc>> {
        // The registry has no bulk metadata endpoint; walk the names.
        let mut out = HashMap::new();
        for name in names {
            let url = format!("{}/{}", self.registry_url, urlencoding::encode(name));
            let Some(response) = self.get_with_backoff(&url).await else {
                continue;
            };
            if !response.status().is_success() {
                debug!("Metadata fetch for {} returned {}", name, response.status());
                continue;
            }
            match response.json::<PackageMeta>().await {
                Ok(meta) => {
                    out.insert(name.clone(), meta.time.modified);
                }
                Err(e) => warn!("Malformed metadata for {}: {}", name, e),
            }
        }
        out
    }
}

/// True when a payload is the bare point object the API returns for a
/// one-name batch. Real packages named "downloads" or "package" map to
/// objects, not to a number and a string, so they cannot trip this.
fn is_singleton_shape(map: &serde_json::Map<String, Value>) -> bool {
    matches!(map.get("downloads"), Some(Value::Number(_)))
        && matches!(map.get("package"), Some(Value::String(_)))
}

/// Split a comma-joined existence response per requested name: an object
/// value means the package exists, an explicit null means it does not.
/// Reserved date-range keys never match a requested name. A payload of the
/// wrong shape yields an empty map.
fn parse_batch_existence(payload: &Value, names: &[String]) -> HashMap<String, bool> {
    let Some(map) = payload.as_object() else {
        return HashMap::new();
    };
    let mut out = HashMap::new();
    if is_singleton_shape(map) {
        if let Some(Value::String(name)) = map.get("package") {
            out.insert(name.clone(), true);
        }
        return out;
    }
    for name in names {
        match map.get(name.as_str()) {
            Some(Value::Object(_)) => {
                out.insert(name.clone(), true);
            }
            Some(Value::Null) => {
                out.insert(name.clone(), false);
            }
            _ => {}
        }
    }
    out
}

/// Split a comma-joined downloads response into per-name counts. Names the
/// registry reported as null or with a malformed point are left out.
fn parse_batch_downloads(payload: &Value, names: &[String]) -> HashMap<String, u64> {
    let Some(map) = payload.as_object() else {
        return HashMap::new();
    };
    let mut out = HashMap::new();
    if is_singleton_shape(map) {
        if let (Some(Value::String(name)), Some(count)) =
            (map.get("package"), map.get("downloads").and_then(Value::as_u64))
        {
            out.insert(name.clone(), count);
        }
        return out;
    }
    for name in names {
        if let Some(Value::Object(point)) = map.get(name.as_str()) {
            if let Some(count) = point.get("downloads").and_then(Value::as_u64) {
                out.insert(name.clone(), count);
            }
        }
    }
    out
}
