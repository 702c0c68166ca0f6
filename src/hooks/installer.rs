//! Script-free package installation capability.

use crate::types::{Result, TypoguardError};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Stub manifest dropped into the scan workdir so npm treats it as a project.
const WORKDIR_MANIFEST: &str = r#"{"name":"typoguard-scan","version":"1.0.0","private":true}"#;

/// A package manager that can fetch a package without running its lifecycle
/// scripts. Injected so hook extraction and rule matching are testable
/// without a real npm on the path.
#[allow(async_fn_in_trait)]
pub trait InstallCapability {
    /// Install `package` into `workdir` with lifecycle scripts suppressed
    /// and return the path of the installed package's own manifest.
    async fn install_without_scripts(&self, package: &str, workdir: &Path) -> Result<PathBuf>;
}

/// The real npm binary.
pub struct NpmCli {
    program: &'static str,
}

impl NpmCli {
    pub fn new() -> Self {
        // npm ships as a .cmd shim on Windows
        let program = if cfg!(windows) { "npm.cmd" } else { "npm" };
        Self { program }
    }

    /// Run a real (scripts enabled) npm verb against the caller's project,
    /// stdio inherited. Returns npm's exit code.
    pub async fn run_verb(&self, verb: &str, package: &str) -> Result<i32> {
        debug!("Running npm {} {}", verb, package);
        let status = Command::new(self.program)
            .arg(verb)
            .arg(package)
            .status()
            .await?;
        Ok(status.code().unwrap_or(1))
    }
}

impl Default for NpmCli {
    fn default() -> Self {
        Self::new()
    }
}

impl InstallCapability for NpmCli {
    async fn install_without_scripts(&self, package: &str, workdir: &Path) -> Result<PathBuf> {
        std::fs::write(workdir.join("package.json"), WORKDIR_MANIFEST)?;

        debug!("Installing {} with scripts suppressed", package);
        let status = Command::new(self.program)
            .arg("install")
            .arg(package)
            .arg("--ignore-scripts")
            .current_dir(workdir)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await?;

        if !status.success() {
            return Err(TypoguardError::InstallError(format!(
                "npm install {package} --ignore-scripts failed with {status}"
            )));
        }
        Ok(workdir
            .join("node_modules")
            .join(package)
            .join("package.json"))
    }
}
