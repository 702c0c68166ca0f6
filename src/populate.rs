//! Legitimate-set population.
//!
//! Seeds the legitimate partition from a list of package names, probing the
//! registry for current downloads and freshness. Already-present names are
//! skipped unless a refresh is requested, and names the registry cannot
//! answer for are reported rather than written with made-up numbers.

use crate::notify::ConsoleOutput;
use crate::registry::RegistryProbe;
use crate::store::Store;
use crate::types::{PackageRecord, PopulateReport, ProbeStatus, Result};
use tracing::{debug, warn};

/// Seed (or refresh) the legitimate partition from `names`.
pub async fn populate<P: RegistryProbe>(
    store: &Store,
    probe: &P,
    names: &[String],
    refresh: bool,
    console: &ConsoleOutput,
) -> Result<PopulateReport> {
    let mut report = PopulateReport::default();
    let pb = console.create_progress_bar(names.len() as u64, "Populating");

    for name in names {
        if let Some(ref pb) = pb {
            pb.inc(1);
        }
        let known = store.legitimate(name)?.is_some();
        if known && !refresh {
            debug!("{} already seeded, skipping", name);
            report.skipped += 1;
            continue;
        }
        match probe.probe(name).await {
            ProbeStatus::Exists(stats) => {
                let record = PackageRecord {
                    name: name.clone(),
                    weekly_downloads: stats.weekly_downloads,
                    monthly_downloads: stats.monthly_downloads,
                    last_update: stats.last_update,
                };
                if !store.add_legitimate(&record)? {
                    report.skipped += 1;
                } else if known {
                    report.refreshed += 1;
                } else {
                    report.seeded += 1;
                }
            }
            ProbeStatus::Absent => {
                warn!("{} does not exist on the registry, not seeding", name);
                report.unavailable += 1;
            }
            ProbeStatus::Unavailable => {
                warn!("Failed to retrieve data for {}", name);
                report.unavailable += 1;
            }
        }
    }

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PackageStats;
    use chrono::{DateTime, TimeZone, Utc};
    use std::cell::RefCell;
    use std::collections::HashMap;

    fn ts(year: i32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, 6, 15, 12, 0, 0).unwrap()
    }

    struct FixedProbe {
        live: HashMap<String, PackageStats>,
        probed: RefCell<usize>,
    }

    impl FixedProbe {
        fn new(live: &[(&str, u64, u64)]) -> Self {
            Self {
                live: live
                    .iter()
                    .map(|&(name, weekly, monthly)| {
                        (
                            name.to_string(),
                            PackageStats {
                                weekly_downloads: weekly,
                                monthly_downloads: monthly,
                                last_update: ts(2025),
                            },
                        )
                    })
                    .collect(),
                probed: RefCell::new(0),
            }
        }
    }

    impl RegistryProbe for FixedProbe {
        async fn probe(&self, name: &str) -> ProbeStatus {
            *self.probed.borrow_mut() += 1;
            match self.live.get(name) {
                Some(stats) => ProbeStatus::Exists(*stats),
                None => ProbeStatus::Absent,
            }
        }

        async fn probe_batch(&self, _names: &[String]) -> HashMap<String, bool> {
            HashMap::new()
        }

        async fn batch_weekly(&self, _names: &[String]) -> HashMap<String, u64> {
            HashMap::new()
        }

        async fn batch_monthly(&self, _names: &[String]) -> HashMap<String, u64> {
            HashMap::new()
        }

        async fn batch_last_update(&self, _names: &[String]) -> HashMap<String, DateTime<Utc>> {
            HashMap::new()
        }
    }

    fn quiet_console() -> ConsoleOutput {
        ConsoleOutput::new(false, false, true)
    }

    #[tokio::test]
    async fn test_seeds_live_names_and_reports_missing_ones() {
        let store = Store::open_in_memory().unwrap();
        let probe = FixedProbe::new(&[("react", 25_000_000, 100_000_000)]);
        let names = vec!["react".to_string(), "not-a-real-pkg".to_string()];

        let report = populate(&store, &probe, &names, false, &quiet_console())
            .await
            .unwrap();

        assert_eq!(report.seeded, 1);
        assert_eq!(report.unavailable, 1);
        let record = store.legitimate("react").unwrap().unwrap();
        assert_eq!(record.weekly_downloads, 25_000_000);
        // an absent seed name is an operator mistake, not a typosquat fact
        assert!(!store.is_unresolved("not-a-real-pkg").unwrap());
    }

    #[tokio::test]
    async fn test_existing_names_skip_unless_refreshing() {
        let store = Store::open_in_memory().unwrap();
        let probe = FixedProbe::new(&[("react", 100, 400)]);
        let names = vec!["react".to_string()];

        populate(&store, &probe, &names, false, &quiet_console())
            .await
            .unwrap();
        assert_eq!(*probe.probed.borrow(), 1);

        let report = populate(&store, &probe, &names, false, &quiet_console())
            .await
            .unwrap();
        assert_eq!(report.skipped, 1);
        assert_eq!(*probe.probed.borrow(), 1);

        let probe = FixedProbe::new(&[("react", 999, 3996)]);
        let report = populate(&store, &probe, &names, true, &quiet_console())
            .await
            .unwrap();
        assert_eq!(report.refreshed, 1);
        assert_eq!(
            store.legitimate("react").unwrap().unwrap().weekly_downloads,
            999
        );
    }
}
