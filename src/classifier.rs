//! Batch classification of generated candidates.
//!
//! Walks the legitimate set, generates candidates, filters out everything
//! the store already knows, and resolves the rest against the registry in
//! comma-joined batches: live names land in the typosquat partition,
//! definitive 404s in the negative cache. Names the upstream cannot answer
//! for are deferred untouched, so the next run picks them up again.

use crate::generator;
use crate::notify::ConsoleOutput;
use crate::registry::{npm, RegistryProbe};
use crate::store::Store;
use crate::types::{Candidate, ClassifyReport, PackageStats, ProbeStatus, Result, TyposquatRecord};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Orchestrates generator, store filter and registry probes for one run.
pub struct Classifier<'a, P> {
    store: &'a Store,
    probe: &'a P,
    console: &'a ConsoleOutput,
    batch_size: usize,
    batch_pause: Duration,
}

impl<'a, P: RegistryProbe> Classifier<'a, P> {
    pub fn new(
        store: &'a Store,
        probe: &'a P,
        console: &'a ConsoleOutput,
        batch_size: usize,
        batch_pause: Duration,
    ) -> Self {
        Self {
            store,
            probe,
            console,
            batch_size: batch_size.clamp(1, npm::MAX_BATCH),
            batch_pause,
        }
    }

    /// Classify every candidate derived from the stored legitimate names.
    pub async fn run(&self) -> Result<ClassifyReport> {
        let names = self.store.legitimate_names()?;
        let mut report = ClassifyReport::default();

        if names.is_empty() {
            info!("Legitimate set is empty, nothing to classify");
            return Ok(report);
        }

        self.console.print_progress(&format!(
            "Generating candidates for {} legitimate names...",
            names.len()
        ));

        let mut seen: HashSet<String> = HashSet::new();
        let mut pending: Vec<Candidate> = Vec::new();
        for name in &names {
            for candidate in generator::candidates_for(name) {
                report.generated += 1;
                if !seen.insert(candidate.name.clone()) {
                    continue;
                }
                if self.store.classification(&candidate.name)?.is_some() {
                    report.already_classified += 1;
                    continue;
                }
                pending.push(candidate);
            }
        }

        let (batchable, singles): (Vec<Candidate>, Vec<Candidate>) =
            pending.into_iter().partition(|c| npm::batchable(&c.name));

        info!(
            "Probing {} candidates ({} batched, {} individual, {} cached)",
            batchable.len() + singles.len(),
            batchable.len(),
            singles.len(),
            report.already_classified
        );

        let pb = self.console.create_progress_bar(
            (batchable.len() + singles.len()) as u64,
            "Classifying",
        );

        for candidate in &singles {
            match self.probe.probe(&candidate.name).await {
                ProbeStatus::Exists(stats) => {
                    if self.record_typosquat(candidate, stats)? {
                        report.confirmed_typosquats += 1;
                    }
                }
                ProbeStatus::Absent => {
                    if self.store.insert_unresolved(&candidate.name)? {
                        report.confirmed_absent += 1;
                    }
                }
                ProbeStatus::Unavailable => {
                    debug!("No registry data for {}, deferring", candidate.name);
                    report.deferred += 1;
                }
            }
            if let Some(ref pb) = pb {
                pb.inc(1);
            }
        }

        for (index, batch) in batchable.chunks(self.batch_size).enumerate() {
            if index > 0 {
                tokio::time::sleep(self.batch_pause).await;
            }
            self.classify_batch(batch, &mut report).await?;
            if let Some(ref pb) = pb {
                pb.inc(batch.len() as u64);
            }
        }

        if let Some(pb) = pb {
            pb.finish_and_clear();
        }

        info!(
            "Classified {} new typosquats, {} absent, {} deferred",
            report.confirmed_typosquats, report.confirmed_absent, report.deferred
        );
        Ok(report)
    }

    /// Resolve one batch: a single existence call, then the three metric
    /// calls for the names that exist.
    async fn classify_batch(&self, batch: &[Candidate], report: &mut ClassifyReport) -> Result<()> {
        let names: Vec<String> = batch.iter().map(|c| c.name.clone()).collect();

        let existence = self.probe.probe_batch(&names).await;
        if existence.is_empty() {
            warn!(
                "Existence call for a batch of {} names returned no data, skipping",
                names.len()
            );
            report.skipped_batches += 1;
            return Ok(());
        }

        let existing: Vec<String> = names
            .iter()
            .filter(|name| existence.get(*name).copied().unwrap_or(false))
            .cloned()
            .collect();

        let (weekly, monthly, updates) = if existing.is_empty() {
            (HashMap::new(), HashMap::new(), HashMap::new())
        } else {
            (
                self.probe.batch_weekly(&existing).await,
                self.probe.batch_monthly(&existing).await,
                self.probe.batch_last_update(&existing).await,
            )
        };

        for candidate in batch {
            match existence.get(&candidate.name) {
                Some(true) => {
                    let stats = match (
                        weekly.get(&candidate.name),
                        monthly.get(&candidate.name),
                        updates.get(&candidate.name),
                    ) {
                        (Some(&weekly), Some(&monthly), Some(&last_update)) => {
                            Some(PackageStats {
                                weekly_downloads: weekly,
                                monthly_downloads: monthly,
                                last_update,
                            })
                        }
                        _ => None,
                    };
                    match stats {
                        Some(stats) => {
                            if self.record_typosquat(candidate, stats)? {
                                report.confirmed_typosquats += 1;
                            }
                        }
                        // never persist a live name with zeroed metrics;
                        // rows are immutable once written
                        None => {
                            debug!("Incomplete metadata for {}, deferring", candidate.name);
                            report.deferred += 1;
                        }
                    }
                }
                Some(false) => {
                    if self.store.insert_unresolved(&candidate.name)? {
                        report.confirmed_absent += 1;
                    }
                }
                None => {
                    debug!("No existence data for {}, deferring", candidate.name);
                    report.deferred += 1;
                }
            }
        }
        Ok(())
    }

    fn record_typosquat(&self, candidate: &Candidate, stats: PackageStats) -> Result<bool> {
        let record = TyposquatRecord {
            name: candidate.name.clone(),
            typosquatted_from: candidate.source.clone(),
            weekly_downloads: stats.weekly_downloads,
            monthly_downloads: stats.monthly_downloads,
            last_update: stats.last_update,
            detection_method: candidate.method.tag(),
        };
        let written = self.store.insert_typosquat(&record)?;
        if written {
            info!(
                "{} is live and shadows {} ({})",
                record.name, record.typosquatted_from, record.detection_method
            );
        }
        Ok(written)
    }
}
