//! typoguard - npm typosquat and install-hook risk scanner.
//!
//! This library provides tools for stopping look-alike package installs by:
//! - Generating plausible typosquat candidates for protected package names
//! - Classifying candidates against the npm registry in rate-limited batches
//! - Persisting the verdicts (legitimate / typosquat / confirmed absent) so
//!   no name is ever probed twice
//! - Scoring names on registry facts and banding them into verdicts
//! - Statically inspecting lifecycle install hooks for dangerous commands
//!
//! # Example
//!
//! ```no_run
//! use typoguard::assess::Assessor;
//! use typoguard::registry::NpmProbe;
//! use typoguard::store::Store;
//! use typoguard::types::HttpConfig;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let store = Store::open_in_memory().unwrap();
//!     let probe = NpmProbe::new(
//!         HttpConfig::default(),
//!         10,
//!         "https://registry.npmjs.org".to_string(),
//!         "https://api.npmjs.org".to_string(),
//!     )
//!     .unwrap();
//!     let assessor = Assessor::new(&store, &probe);
//!     let assessment = assessor.assess("lodashs").await.unwrap();
//!     println!("{:?}", assessment);
//! }
//! ```

pub mod assess;
pub mod classifier;
pub mod config;
pub mod generator;
pub mod hooks;
pub mod notify;
pub mod populate;
pub mod registry;
pub mod scoring;
pub mod store;
pub mod types;

pub use assess::Assessor;
pub use classifier::Classifier;
pub use config::{Commands, Config};
pub use store::Store;
pub use types::{
    Assessment, Candidate, Classification, DetectionMethod, HookBand, HookFinding, HookReport,
    PackageRecord, PackageStats, ProbeStatus, Result, RiskBand, TypoguardError, TyposquatRecord,
};
