//! Query-time classification of a single package name.
//!
//! The store answers first: the legitimate partition short-circuits to a
//! zero-risk verdict, the typosquat partition is scored against its origin,
//! and the negative cache stands in for a live 404. Only names the store
//! has never seen cost a registry round-trip.

use crate::registry::RegistryProbe;
use crate::scoring;
use crate::store::Store;
use crate::types::{Assessment, Classification, ProbeStatus, Result};
use chrono::Utc;
use tracing::{debug, warn};

/// Resolves one name to an [`Assessment`].
pub struct Assessor<'a, P> {
    store: &'a Store,
    probe: &'a P,
}

impl<'a, P: RegistryProbe> Assessor<'a, P> {
    pub fn new(store: &'a Store, probe: &'a P) -> Self {
        Self { store, probe }
    }

    pub async fn assess(&self, name: &str) -> Result<Assessment> {
        match self.store.classification(name)? {
            Some(Classification::Legitimate(record)) => {
                debug!("{} is in the legitimate set", name);
                return Ok(Assessment::Legitimate { record });
            }
            Some(Classification::Typosquat(record)) => {
                let score = match self.store.legitimate(&record.typosquatted_from)? {
                    Some(origin) => scoring::typosquat_score(&origin, &record),
                    // scored on the mutation family alone when the origin
                    // has been pruned since classification
                    None => {
                        warn!(
                            "Origin {} of {} is no longer in the legitimate set",
                            record.typosquatted_from, record.name
                        );
                        scoring::method_weight(&record.detection_method)
                    }
                };
                return Ok(Assessment::Typosquat {
                    record,
                    score,
                    band: scoring::band(score),
                });
            }
            Some(Classification::Unresolved) => {
                debug!("{} is cached as absent", name);
                return Ok(Assessment::Absent);
            }
            None => {}
        }

        match self.probe.probe(name).await {
            ProbeStatus::Exists(stats) => {
                let score = scoring::suspicious_score(&stats, Utc::now());
                Ok(Assessment::Unknown {
                    stats,
                    score,
                    band: scoring::band(score),
                })
            }
            ProbeStatus::Absent => Ok(Assessment::Absent),
            ProbeStatus::Unavailable => Ok(Assessment::Unavailable),
        }
    }
}
