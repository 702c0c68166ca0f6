//! npm registry probing module.
//!
//! Resolves package existence, download counts and modification timestamps,
//! one name at a time or in comma-joined batches, degrading gracefully when
//! the upstream throttles or fails.

pub mod npm;

pub use npm::NpmProbe;

use crate::types::ProbeStatus;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Registry access seam. The classifier, the populator and the assessor
/// speak this trait so tests can stub and count probe traffic.
///
/// Batch methods return per-name maps; an empty map means the call itself
/// produced no usable data, never that every name is absent.
#[allow(async_fn_in_trait)]
pub trait RegistryProbe {
    /// Full probe of one package: existence, downloads, last update.
    async fn probe(&self, name: &str) -> ProbeStatus;

    /// Existence of up to [`npm::MAX_BATCH`] packages in one call.
    async fn probe_batch(&self, names: &[String]) -> HashMap<String, bool>;

    /// Weekly download counts for packages known to exist.
    async fn batch_weekly(&self, names: &[String]) -> HashMap<String, u64>;

    /// Monthly download counts for packages known to exist.
    async fn batch_monthly(&self, names: &[String]) -> HashMap<String, u64>;

    /// Modification timestamps for packages known to exist.
    async fn batch_last_update(&self, names: &[String]) -> HashMap<String, DateTime<Utc>>;
}
