//! SQLite-backed classification store.
//!
//! Three partitions keyed by package name: `legitimate` (the protected
//! set), `typosquats` (confirmed live look-alikes with their origin and
//! detection tag), and `unresolved` (names confirmed absent upstream, kept
//! as a negative cache). Inserts are insert-or-ignore and refuse names
//! already classified elsewhere, so repeated runs are idempotent and no
//! name ever lands in two partitions.

use crate::types::{Classification, PackageRecord, Result, StoreCounts, TyposquatRecord};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use tracing::{debug, warn};

/// Handle to the classification database. One connection per process; it
/// closes on drop on every exit path.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (or create) the database at `path` and ensure the schema.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        debug!("Opening classification store at {}", path.display());
        Self::init(Connection::open(path)?)
    }

    /// Throwaway in-memory store.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;

            CREATE TABLE IF NOT EXISTS legitimate (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT UNIQUE NOT NULL,
                weekly_downloads INTEGER NOT NULL,
                monthly_downloads INTEGER NOT NULL,
                last_update TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS typosquats (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT UNIQUE NOT NULL,
                typosquatted_from TEXT NOT NULL,
                weekly_downloads INTEGER NOT NULL,
                monthly_downloads INTEGER NOT NULL,
                last_update TEXT NOT NULL,
                detection_method TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS unresolved (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT UNIQUE NOT NULL
            );",
        )?;
        Ok(Self { conn })
    }

    /// Exact-match lookup across all partitions. Checked in fixed order:
    /// typosquat, legitimate, unresolved.
    pub fn classification(&self, name: &str) -> Result<Option<Classification>> {
        if let Some(record) = self.typosquat(name)? {
            return Ok(Some(Classification::Typosquat(record)));
        }
        if let Some(record) = self.legitimate(name)? {
            return Ok(Some(Classification::Legitimate(record)));
        }
        if self.is_unresolved(name)? {
            return Ok(Some(Classification::Unresolved));
        }
        Ok(None)
    }

    /// Fetch one legitimate row by exact name.
    pub fn legitimate(&self, name: &str) -> Result<Option<PackageRecord>> {
        let row = self
            .conn
            .query_row(
                "SELECT name, weekly_downloads, monthly_downloads, last_update
                 FROM legitimate WHERE name = ?1",
                params![name],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;
        match row {
            Some((name, weekly, monthly, raw_ts)) => Ok(Some(PackageRecord {
                name,
                weekly_downloads: weekly as u64,
                monthly_downloads: monthly as u64,
                last_update: parse_timestamp(&raw_ts)?,
            })),
            None => Ok(None),
        }
    }

    /// Fetch one typosquat row by exact name.
    pub fn typosquat(&self, name: &str) -> Result<Option<TyposquatRecord>> {
        let row = self
            .conn
            .query_row(
                "SELECT name, typosquatted_from, weekly_downloads, monthly_downloads,
                        last_update, detection_method
                 FROM typosquats WHERE name = ?1",
                params![name],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, String>(5)?,
                    ))
                },
            )
            .optional()?;
        match row {
            Some((name, origin, weekly, monthly, raw_ts, method)) => Ok(Some(TyposquatRecord {
                name,
                typosquatted_from: origin,
                weekly_downloads: weekly as u64,
                monthly_downloads: monthly as u64,
                last_update: parse_timestamp(&raw_ts)?,
                detection_method: method,
            })),
            None => Ok(None),
        }
    }

    /// Whether a name sits in the negative cache.
    pub fn is_unresolved(&self, name: &str) -> Result<bool> {
        let hit = self
            .conn
            .query_row(
                "SELECT 1 FROM unresolved WHERE name = ?1",
                params![name],
                |_| Ok(()),
            )
            .optional()?;
        Ok(hit.is_some())
    }

    /// Insert or update a legitimate package in place. Returns false and
    /// writes nothing when the name is already classified elsewhere.
    pub fn add_legitimate(&self, record: &PackageRecord) -> Result<bool> {
        if self.typosquat(&record.name)?.is_some() || self.is_unresolved(&record.name)? {
            warn!(
                "Refusing to add {} to the legitimate set: already classified",
                record.name
            );
            return Ok(false);
        }
        self.conn.execute(
            "INSERT INTO legitimate (name, weekly_downloads, monthly_downloads, last_update)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(name) DO UPDATE SET
                 weekly_downloads = ?2,
                 monthly_downloads = ?3,
                 last_update = ?4",
            params![
                record.name,
                to_db_count(record.weekly_downloads),
                to_db_count(record.monthly_downloads),
                record.last_update.to_rfc3339(),
            ],
        )?;
        Ok(true)
    }

    /// Insert-if-absent into the typosquat partition. Returns whether a row
    /// was written; names present in any partition are left untouched.
    pub fn insert_typosquat(&self, record: &TyposquatRecord) -> Result<bool> {
        if self.legitimate(&record.name)?.is_some() || self.is_unresolved(&record.name)? {
            warn!(
                "Refusing to classify {} as a typosquat: already in another partition",
                record.name
            );
            return Ok(false);
        }
        let written = self.conn.execute(
            "INSERT OR IGNORE INTO typosquats
                 (name, typosquatted_from, weekly_downloads, monthly_downloads,
                  last_update, detection_method)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                record.name,
                record.typosquatted_from,
                to_db_count(record.weekly_downloads),
                to_db_count(record.monthly_downloads),
                record.last_update.to_rfc3339(),
                record.detection_method,
            ],
        )?;
        Ok(written > 0)
    }

    /// Insert-if-absent into the negative cache. Returns whether a row was
    /// written; names present in any partition are left untouched.
    pub fn insert_unresolved(&self, name: &str) -> Result<bool> {
        if self.legitimate(name)?.is_some() || self.typosquat(name)?.is_some() {
            warn!(
                "Refusing to mark {} unresolved: already in another partition",
                name
            );
            return Ok(false);
        }
        let written = self.conn.execute(
            "INSERT OR IGNORE INTO unresolved (name) VALUES (?1)",
            params![name],
        )?;
        Ok(written > 0)
    }

    /// Remove legitimate rows whose downloads fall below both floors.
    /// Returns the number of rows removed.
    pub fn prune_legitimate(&self, weekly_floor: u64, monthly_floor: u64) -> Result<usize> {
        let removed = self.conn.execute(
            "DELETE FROM legitimate
             WHERE weekly_downloads < ?1 AND monthly_downloads < ?2",
            params![to_db_count(weekly_floor), to_db_count(monthly_floor)],
        )?;
        Ok(removed)
    }

    /// All names in the legitimate partition, ordered for stable runs.
    pub fn legitimate_names(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM legitimate ORDER BY name")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        let mut names = Vec::new();
        for name in rows {
            names.push(name?);
        }
        Ok(names)
    }

    /// Row counts for every partition.
    pub fn counts(&self) -> Result<StoreCounts> {
        Ok(StoreCounts {
            legitimate: self.count_rows("legitimate")?,
            typosquats: self.count_rows("typosquats")?,
            unresolved: self.count_rows("unresolved")?,
        })
    }

    fn count_rows(&self, table: &str) -> Result<u64> {
        // table names come from the fixed set above, never from input
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {table}"),
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Sums of typosquat downloads strictly below the given per-metric
    /// limits, the aggregate the stats command reports.
    pub fn typosquat_download_sums(&self, weekly_limit: u64, monthly_limit: u64) -> Result<(u64, u64)> {
        let (weekly, monthly): (i64, i64) = self.conn.query_row(
            "SELECT
                 COALESCE(SUM(CASE WHEN weekly_downloads < ?1 THEN weekly_downloads ELSE 0 END), 0),
                 COALESCE(SUM(CASE WHEN monthly_downloads < ?2 THEN monthly_downloads ELSE 0 END), 0)
             FROM typosquats",
            params![to_db_count(weekly_limit), to_db_count(monthly_limit)],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok((weekly as u64, monthly as u64))
    }
}

/// SQLite integers are signed; clamp so u64::MAX-style sentinels stay
/// comparable instead of wrapping negative.
fn to_db_count(count: u64) -> i64 {
    count.min(i64::MAX as u64) as i64
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)?.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(year: i32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, 6, 15, 12, 0, 0).unwrap()
    }

    fn legit(name: &str, weekly: u64, monthly: u64) -> PackageRecord {
        PackageRecord {
            name: name.to_string(),
            weekly_downloads: weekly,
            monthly_downloads: monthly,
            last_update: ts(2024),
        }
    }

    fn squat(name: &str, origin: &str) -> TyposquatRecord {
        TyposquatRecord {
            name: name.to_string(),
            typosquatted_from: origin.to_string(),
            weekly_downloads: 50,
            monthly_downloads: 200,
            last_update: ts(2021),
            detection_method: "levenshtein edit".to_string(),
        }
    }

    #[test]
    fn test_legitimate_roundtrip() {
        let store = Store::open_in_memory().unwrap();
        let record = legit("react", 25_000_000, 100_000_000);
        assert!(store.add_legitimate(&record).unwrap());
        assert_eq!(store.legitimate("react").unwrap().unwrap(), record);
        assert!(store.legitimate("vue").unwrap().is_none());
    }

    #[test]
    fn test_add_legitimate_updates_in_place() {
        let store = Store::open_in_memory().unwrap();
        store.add_legitimate(&legit("react", 10, 40)).unwrap();
        store.add_legitimate(&legit("react", 99, 400)).unwrap();
        let record = store.legitimate("react").unwrap().unwrap();
        assert_eq!(record.weekly_downloads, 99);
        assert_eq!(store.counts().unwrap().legitimate, 1);
    }

    #[test]
    fn test_typosquat_insert_is_idempotent() {
        let store = Store::open_in_memory().unwrap();
        assert!(store.insert_typosquat(&squat("reacct", "react")).unwrap());
        assert!(!store.insert_typosquat(&squat("reacct", "react")).unwrap());
        assert_eq!(store.counts().unwrap().typosquats, 1);
        let record = store.typosquat("reacct").unwrap().unwrap();
        assert_eq!(record.typosquatted_from, "react");
        assert_eq!(record.last_update, ts(2021));
    }

    #[test]
    fn test_partitions_never_share_a_name() {
        let store = Store::open_in_memory().unwrap();
        store.add_legitimate(&legit("react", 10, 40)).unwrap();
        assert!(!store.insert_typosquat(&squat("react", "other")).unwrap());
        assert!(!store.insert_unresolved("react").unwrap());

        assert!(store.insert_unresolved("reactt").unwrap());
        assert!(!store.insert_typosquat(&squat("reactt", "react")).unwrap());
        assert!(!store.add_legitimate(&legit("reactt", 1, 1)).unwrap());

        let counts = store.counts().unwrap();
        assert_eq!(counts.legitimate, 1);
        assert_eq!(counts.typosquats, 0);
        assert_eq!(counts.unresolved, 1);
    }

    #[test]
    fn test_classification_covers_all_partitions() {
        let store = Store::open_in_memory().unwrap();
        store.add_legitimate(&legit("react", 10, 40)).unwrap();
        store.insert_typosquat(&squat("reacct", "react")).unwrap();
        store.insert_unresolved("r3act").unwrap();

        assert!(matches!(
            store.classification("react").unwrap(),
            Some(Classification::Legitimate(_))
        ));
        assert!(matches!(
            store.classification("reacct").unwrap(),
            Some(Classification::Typosquat(_))
        ));
        assert!(matches!(
            store.classification("r3act").unwrap(),
            Some(Classification::Unresolved)
        ));
        assert!(store.classification("unknown").unwrap().is_none());
    }

    #[test]
    fn test_prune_removes_only_rows_below_both_floors() {
        let store = Store::open_in_memory().unwrap();
        store.add_legitimate(&legit("tiny", 5, 20)).unwrap();
        store.add_legitimate(&legit("weekly-only", 5, 5000)).unwrap();
        store.add_legitimate(&legit("big", 5000, 20000)).unwrap();

        let removed = store.prune_legitimate(100, 400).unwrap();
        assert_eq!(removed, 1);
        assert!(store.legitimate("tiny").unwrap().is_none());
        assert!(store.legitimate("weekly-only").unwrap().is_some());

        // a single-metric prune leaves the other floor wide open
        let removed = store.prune_legitimate(100, u64::MAX).unwrap();
        assert_eq!(removed, 1);
        assert!(store.legitimate("weekly-only").unwrap().is_none());
        assert!(store.legitimate("big").unwrap().is_some());
    }

    #[test]
    fn test_legitimate_names_sorted() {
        let store = Store::open_in_memory().unwrap();
        store.add_legitimate(&legit("vue", 1000, 4000)).unwrap();
        store.add_legitimate(&legit("axios", 1000, 4000)).unwrap();
        assert_eq!(store.legitimate_names().unwrap(), vec!["axios", "vue"]);
    }

    #[test]
    fn test_typosquat_download_sums_respect_limits() {
        let store = Store::open_in_memory().unwrap();
        let mut low = squat("reacct", "react");
        low.weekly_downloads = 50;
        low.monthly_downloads = 200;
        let mut high = squat("lodahs", "lodash");
        high.weekly_downloads = 5_000;
        high.monthly_downloads = 20_000;
        store.insert_typosquat(&low).unwrap();
        store.insert_typosquat(&high).unwrap();

        let (weekly, monthly) = store.typosquat_download_sums(1000, 1000).unwrap();
        assert_eq!(weekly, 50);
        assert_eq!(monthly, 200);

        let (weekly, monthly) = store.typosquat_download_sums(u64::MAX, u64::MAX).unwrap();
        assert_eq!(weekly, 5050);
        assert_eq!(monthly, 20_200);
    }
}
