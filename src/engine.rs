//! Transformation engine interface and the native tool driver
//!
//! The engine that actually rewrites the metadata artifact's bytes and
//! patches/restores the toolchain binaries is external to this crate. It is
//! reached through the [`TransformationEngine`] capability trait so the
//! pipeline can be exercised against a recording fake in tests, and driven
//! in production by [`NativeToolEngine`], which runs the proprietary native
//! tool as a subprocess.

use anyhow::{bail, Context, Result};
use std::ffi::OsString;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;

/// Capability interface to the external transformation engine
///
/// `prepare` patches the toolchain before the build produces the artifact;
/// `modify` rewrites the artifact; `restore` undoes the toolchain patch and
/// must be idempotent: calling it with nothing modified is safe and
/// succeeds.
pub trait TransformationEngine {
    /// Patch the toolchain for this build, binding it to `key`
    fn prepare(&self, toolchain: &Path, key: &str, experimental: bool) -> Result<()>;

    /// Rewrite the metadata artifact in place using `key`
    fn modify(&self, artifact: &Path, toolchain: &Path, key: &str) -> Result<()>;

    /// Restore the toolchain to its unmodified state
    ///
    /// Returns whether restoration succeeded. Idempotent.
    fn restore(&self, toolchain: &Path) -> Result<bool>;

    /// Engine version string for display; `"?"` when unknown
    fn version(&self) -> String;
}

/// Program name of the native transformation tool, resolved via `PATH`
pub const DEFAULT_PROGRAM: &str = "metashield-native";

/// Diagnostic severity of a native tool output line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Severity {
    Info,
    Warning,
    Error,
}

/// Split a diagnostic line from the native tool into severity and message
fn classify(line: &str) -> (Severity, &str) {
    if let Some(rest) = line.strip_prefix("error:") {
        (Severity::Error, rest.trim_start())
    } else if let Some(rest) = line.strip_prefix("warning:") {
        (Severity::Warning, rest.trim_start())
    } else {
        (Severity::Info, line)
    }
}

fn forward_diagnostic(line: &str) {
    let line = line.trim_end();
    if line.is_empty() {
        return;
    }
    match classify(line) {
        (Severity::Error, msg) => tracing::error!(target: "metashield::engine", "{}", msg),
        (Severity::Warning, msg) => tracing::warn!(target: "metashield::engine", "{}", msg),
        (Severity::Info, msg) => tracing::info!(target: "metashield::engine", "{}", msg),
    }
}

/// Driver for the external native transformation tool
pub struct NativeToolEngine {
    program: PathBuf,
}

impl NativeToolEngine {
    /// Drive the tool at `program`
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Run one tool subcommand to completion
    ///
    /// The tool's diagnostic stream is forwarded line by line to the log
    /// from a reader thread while the call blocks, so progress from
    /// minutes-long operations is visible as it happens. The thread ends
    /// with the stream; lines cannot outlive the call.
    fn run(&self, args: Vec<OsString>) -> Result<std::process::ExitStatus> {
        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to launch \"{}\"", self.program.display()))?;

        let reader = child.stderr.take().map(|stderr| {
            thread::spawn(move || {
                for line in BufReader::new(stderr).lines().map_while(|line| line.ok()) {
                    forward_diagnostic(&line);
                }
            })
        });

        let status = child.wait().context("native tool did not exit")?;
        if let Some(handle) = reader {
            let _ = handle.join();
        }
        Ok(status)
    }
}

impl Default for NativeToolEngine {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM)
    }
}

impl TransformationEngine for NativeToolEngine {
    fn prepare(&self, toolchain: &Path, key: &str, experimental: bool) -> Result<()> {
        let mut args: Vec<OsString> = vec![
            "prepare".into(),
            toolchain.as_os_str().into(),
            "--key".into(),
            key.into(),
        ];
        if experimental {
            args.push("--experimental".into());
        }
        let status = self.run(args)?;
        if !status.success() {
            bail!("prepare exited with {status}");
        }
        Ok(())
    }

    fn modify(&self, artifact: &Path, toolchain: &Path, key: &str) -> Result<()> {
        let status = self.run(vec![
            "modify".into(),
            artifact.as_os_str().into(),
            "--toolchain".into(),
            toolchain.as_os_str().into(),
            "--key".into(),
            key.into(),
        ])?;
        if !status.success() {
            bail!("modify exited with {status}");
        }
        Ok(())
    }

    fn restore(&self, toolchain: &Path) -> Result<bool> {
        let status = self.run(vec!["restore".into(), toolchain.as_os_str().into()])?;
        Ok(status.success())
    }

    fn version(&self) -> String {
        let output = Command::new(&self.program)
            .arg("version")
            .stdin(Stdio::null())
            .output();
        match output {
            Ok(output) if output.status.success() => {
                String::from_utf8_lossy(&output.stdout).trim().to_string()
            }
            _ => "?".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_severities() {
        assert_eq!(classify("error: patch failed"), (Severity::Error, "patch failed"));
        assert_eq!(classify("warning: slow disk"), (Severity::Warning, "slow disk"));
        assert_eq!(classify("patching section 3"), (Severity::Info, "patching section 3"));
    }

    #[test]
    fn test_missing_tool_reports_unknown_version() {
        let engine = NativeToolEngine::new("metashield-native-test-missing");
        assert_eq!(engine.version(), "?");
    }

    #[test]
    fn test_missing_tool_errors_on_prepare() {
        let engine = NativeToolEngine::new("metashield-native-test-missing");
        assert!(engine
            .prepare(Path::new("/toolchain"), "key", false)
            .is_err());
    }

    #[test]
    fn test_missing_tool_errors_on_restore() {
        let engine = NativeToolEngine::new("metashield-native-test-missing");
        assert!(engine.restore(Path::new("/toolchain")).is_err());
    }
}
