//! Core types and errors for the typosquat scanner.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during scanning.
#[derive(Error, Debug)]
pub enum TypoguardError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    DbError(#[from] rusqlite::Error),

    #[error("Timestamp parse error: {0}")]
    TimestampError(#[from] chrono::ParseError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Rule pattern error: {0}")]
    RuleError(#[from] regex::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Install error: {0}")]
    InstallError(String),
}

pub type Result<T> = std::result::Result<T, TypoguardError>;

/// Download counts and last-modified metadata observed for a registry package.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PackageStats {
    pub weekly_downloads: u64,
    pub monthly_downloads: u64,
    pub last_update: DateTime<Utc>,
}

/// A row in the legitimate partition.
///
/// Updated in place when the same name is re-observed; removed only by the
/// explicit low-download pruning pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PackageRecord {
    pub name: String,
    pub weekly_downloads: u64,
    pub monthly_downloads: u64,
    pub last_update: DateTime<Utc>,
}

/// A row in the typosquat partition. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TyposquatRecord {
    /// The confirmed-existing look-alike name.
    pub name: String,
    /// The legitimate package this name impersonates (back-reference by name).
    pub typosquatted_from: String,
    pub weekly_downloads: u64,
    pub monthly_downloads: u64,
    pub last_update: DateTime<Utc>,
    /// Human-readable tag of the mutation strategy that produced the candidate.
    pub detection_method: String,
}

/// How a candidate name was derived from its source package.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum DetectionMethod {
    /// Single character-level edit (trailing s, duplication, deletion,
    /// adjacent swap, keyboard-neighbor substitution).
    Levenshtein,
    /// A visually confusable character substituted for all occurrences of the
    /// original.
    Homograph { original: char, lookalike: char },
    /// Ecosystem-flavored prefix or suffix tacked onto the name.
    Combosquatting,
    /// Hyphens and underscores exchanged.
    SeparatorSwap,
}

impl DetectionMethod {
    /// Human-readable tag persisted with each typosquat record. The scoring
    /// engine recognizes the family by keyword, so each variant keeps its
    /// keyword stable.
    pub fn tag(&self) -> String {
        match self {
            Self::Levenshtein => "levenshtein edit".to_string(),
            Self::Homograph {
                original,
                lookalike,
            } => format!(
                "homograph: '{}' replaced by '{}' (U+{:04X})",
                original, lookalike, *lookalike as u32
            ),
            Self::Combosquatting => "combosquatting affix".to_string(),
            Self::SeparatorSwap => "hyphen/underscore swap".to_string(),
        }
    }
}

/// A generated alternate name an attacker could plausibly have registered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Candidate {
    /// The mutated package name to probe.
    pub name: String,
    /// The legitimate package this candidate would impersonate.
    pub source: String,
    /// Which mutation strategy produced it.
    pub method: DetectionMethod,
}

/// Result of probing the registry for a single package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeStatus {
    /// Package exists with complete download and last-update metadata.
    Exists(PackageStats),
    /// The registry explicitly reported the package missing. Only this
    /// outcome may feed the negative cache.
    Absent,
    /// No usable answer (transport failure, throttling exhausted, bad
    /// payload). Never conflated with absence.
    Unavailable,
}

/// Which partition of the classification store a name belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Legitimate(PackageRecord),
    Typosquat(TyposquatRecord),
    /// Confirmed absent upstream (negative cache).
    Unresolved,
}

/// Three-level verdict derived from a numeric risk score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum RiskBand {
    /// Score below 5.
    Legitimate,
    /// Score 5 through 9.
    Suspicious,
    /// Score 10 and above.
    Malicious,
}

impl RiskBand {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Legitimate => "Low Risk",
            Self::Suspicious => "Medium Risk",
            Self::Malicious => "High Risk",
        }
    }
}

/// Outcome of the query-time classification pipeline for one name.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub enum Assessment {
    /// Present in the legitimate partition: score 0, no further checks.
    Legitimate { record: PackageRecord },
    /// Present in the typosquat partition, scored against its origin.
    Typosquat {
        record: TyposquatRecord,
        score: u32,
        band: RiskBand,
    },
    /// Unknown name probed live and scored on its own registry facts.
    Unknown {
        stats: PackageStats,
        score: u32,
        band: RiskBand,
    },
    /// The registry (or the negative cache) says no such package exists.
    Absent,
    /// The registry gave no usable answer for an unknown name.
    Unavailable,
}

/// A hook command matching one scanner rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HookFinding {
    /// Which lifecycle hook the command came from.
    pub hook: String,
    /// The rule pattern that matched.
    pub pattern: String,
    /// Why a match is dangerous.
    pub description: String,
    /// Rule weight, 1 (low) to 5 (critical).
    pub severity: u32,
}

/// Result of statically inspecting a package's lifecycle install hooks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HookReport {
    pub package: String,
    /// Names of the recognized lifecycle hooks present in the manifest.
    pub scripts_found: Vec<String>,
    pub findings: Vec<HookFinding>,
    /// Sum of the severities of every matched rule.
    pub risk_score: u32,
}

/// Install-hook risk banding for display.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum HookBand {
    Low,
    Medium,
    High,
}

impl HookReport {
    pub fn band(&self) -> HookBand {
        match self.risk_score {
            0..=1 => HookBand::Low,
            2..=3 => HookBand::Medium,
            _ => HookBand::High,
        }
    }
}

/// Counters from one batch-classifier run.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ClassifyReport {
    /// Candidates produced by the generator across all legitimate names.
    pub generated: usize,
    /// Candidates skipped because some partition already holds them.
    pub already_classified: usize,
    /// Names confirmed upstream and recorded as typosquats.
    pub confirmed_typosquats: usize,
    /// Names confirmed missing and recorded in the negative cache.
    pub confirmed_absent: usize,
    /// Existing names deferred because their metadata came back incomplete.
    pub deferred: usize,
    /// Batches skipped because the existence call returned no usable data.
    pub skipped_batches: usize,
}

/// Counters from one populate run.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct PopulateReport {
    /// Names newly added to the legitimate partition.
    pub seeded: usize,
    /// Existing names re-probed and updated in place.
    pub refreshed: usize,
    /// Names skipped because they were already present.
    pub skipped: usize,
    /// Names the registry returned no usable data for.
    pub unavailable: usize,
    /// Legitimate rows removed by the pruning pass.
    pub pruned: usize,
}

/// Row counts across the three store partitions.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct StoreCounts {
    pub legitimate: u64,
    pub typosquats: u64,
    pub unresolved: u64,
}

/// Configuration for HTTP requests.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_retries: 3,
            user_agent: "typoguard/0.1".to_string(),
        }
    }
}
