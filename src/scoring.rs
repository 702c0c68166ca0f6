//! Risk scoring engine.
//!
//! Two pure scoring paths share the 0..=15 scale and the verdict bands:
//! [`typosquat_score`] rates a confirmed typosquat against the package it
//! impersonates, [`suspicious_score`] rates an unclassified name on its own
//! registry facts. Every factor's bands are mutually exclusive and checked
//! strictest-first, so a worse input never produces a lower score.

use crate::types::{PackageRecord, PackageStats, RiskBand, TyposquatRecord};
use chrono::{DateTime, Utc};

/// Upper bound of both scoring functions (the rule weights sum to it).
pub const MAX_SCORE: u32 = 15;

/// Candidates at or above this volume are popular enough that download
/// deviation stops being a signal.
const POPULARITY_CEILING_WEEKLY: u64 = 1_000_000;
const POPULARITY_CEILING_MONTHLY: u64 = 10_000_000;

/// Both counts below these floors are implausibly small for a real package.
const TINY_WEEKLY: u64 = 100;
const TINY_MONTHLY: u64 = 400;

/// Map a score to its verdict band.
pub fn band(score: u32) -> RiskBand {
    match score {
        0..=4 => RiskBand::Legitimate,
        5..=9 => RiskBand::Suspicious,
        _ => RiskBand::Malicious,
    }
}

/// Weight of the mutation family named in a detection tag. Exactly one
/// family applies per candidate.
pub fn method_weight(tag: &str) -> u32 {
    let tag = tag.to_ascii_lowercase();
    if tag.contains("homograph") {
        5
    } else if tag.contains("levenshtein") {
        4
    } else if tag.contains("combosquatting") {
        3
    } else if tag.contains("hyphen/underscore") {
        2
    } else {
        0
    }
}

/// Score a confirmed typosquat against the package it impersonates.
///
/// Sums the mutation-family weight, the download deviation from the origin
/// (only while the candidate itself stays under the popularity ceiling) and
/// how far the candidate's last update trails the origin's.
pub fn typosquat_score(origin: &PackageRecord, record: &TyposquatRecord) -> u32 {
    let mut score = method_weight(&record.detection_method);

    if record.weekly_downloads < POPULARITY_CEILING_WEEKLY
        && record.monthly_downloads < POPULARITY_CEILING_MONTHLY
    {
        let deviation = [
            relative_deviation(origin.weekly_downloads, record.weekly_downloads),
            relative_deviation(origin.monthly_downloads, record.monthly_downloads),
        ]
        .into_iter()
        .flatten()
        .fold(0.0_f64, f64::max);

        score += if deviation >= 0.5 {
            5
        } else if deviation >= 0.2 {
            3
        } else if deviation >= 0.1 {
            2
        } else {
            0
        };
    }

    score += match years_between(record.last_update, origin.last_update) {
        years if years >= 3 => 5,
        2 => 3,
        1 => 2,
        _ => 0,
    };

    score
}

/// Score an unclassified name on its own registry facts: weekly/monthly
/// consistency plus staleness relative to `now`.
pub fn suspicious_score(stats: &PackageStats, now: DateTime<Utc>) -> u32 {
    let mut score = consistency_points(stats.weekly_downloads, stats.monthly_downloads);

    score += match years_between(stats.last_update, now) {
        years if years >= 4 => 7,
        3 => 5,
        2 => 3,
        1 => 1,
        _ => 0,
    };

    score
}

/// Monthly downloads should track weekly times four; score the mismatch.
fn consistency_points(weekly: u64, monthly: u64) -> u32 {
    if weekly < TINY_WEEKLY && monthly < TINY_MONTHLY {
        return 8;
    }
    let expected = (weekly * 4) as f64;
    if expected == 0.0 {
        // non-tiny monthly volume on zero weekly cannot be consistent
        return 8;
    }
    let deviation = (monthly as f64 - expected).abs() / expected;
    if deviation > 0.7 {
        8
    } else if deviation > 0.5 {
        5
    } else if deviation > 0.3 {
        2
    } else {
        0
    }
}

/// Relative deviation of `candidate` from `origin`; `None` when the origin
/// metric is zero and the ratio is undefined.
fn relative_deviation(origin: u64, candidate: u64) -> Option<f64> {
    if origin == 0 {
        return None;
    }
    Some((origin as f64 - candidate as f64).abs() / origin as f64)
}

/// Full years from `earlier` to `later`, zero when `later` is not after it.
fn years_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> i64 {
    let days = later.signed_duration_since(earlier).num_days();
    if days < 0 {
        0
    } else {
        days / 365
    }
}
