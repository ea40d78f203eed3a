//! Recording fake engine for tests
//!
//! [`RecordingEngine`] implements [`TransformationEngine`] by appending
//! every call to a shared log instead of touching real files. Cloning the
//! engine shares the log, so a test can hand one clone to the pipeline and
//! keep another to inspect afterwards. [`FailureConfig`] injects failures
//! into individual operations.

use crate::engine::TransformationEngine;
use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// One recorded engine call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    Prepare {
        toolchain: PathBuf,
        key: String,
        experimental: bool,
    },
    Modify {
        artifact: PathBuf,
        toolchain: PathBuf,
        key: String,
    },
    Restore {
        toolchain: PathBuf,
    },
}

/// Failure injection for [`RecordingEngine`]
#[derive(Debug, Clone, Copy, Default)]
pub struct FailureConfig {
    /// `prepare` returns an error
    pub fail_prepare: bool,
    /// `modify` returns an error
    pub fail_modify: bool,
    /// `restore` returns an error
    pub fail_restore: bool,
    /// `restore` completes but reports `false`
    pub restore_reports_false: bool,
}

/// Call-recording [`TransformationEngine`] implementation
#[derive(Clone, Default)]
pub struct RecordingEngine {
    calls: Arc<Mutex<Vec<EngineCall>>>,
    failures: FailureConfig,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_failures(failures: FailureConfig) -> Self {
        Self {
            calls: Arc::default(),
            failures,
        }
    }

    /// Snapshot of all calls recorded so far, in order
    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().expect("call log poisoned").clone()
    }

    fn record(&self, call: EngineCall) {
        self.calls.lock().expect("call log poisoned").push(call);
    }
}

impl TransformationEngine for RecordingEngine {
    fn prepare(&self, toolchain: &Path, key: &str, experimental: bool) -> Result<()> {
        self.record(EngineCall::Prepare {
            toolchain: toolchain.to_path_buf(),
            key: key.to_string(),
            experimental,
        });
        if self.failures.fail_prepare {
            return Err(anyhow!("injected prepare failure"));
        }
        Ok(())
    }

    fn modify(&self, artifact: &Path, toolchain: &Path, key: &str) -> Result<()> {
        self.record(EngineCall::Modify {
            artifact: artifact.to_path_buf(),
            toolchain: toolchain.to_path_buf(),
            key: key.to_string(),
        });
        if self.failures.fail_modify {
            return Err(anyhow!("injected modify failure"));
        }
        Ok(())
    }

    fn restore(&self, toolchain: &Path) -> Result<bool> {
        self.record(EngineCall::Restore {
            toolchain: toolchain.to_path_buf(),
        });
        if self.failures.fail_restore {
            return Err(anyhow!("injected restore failure"));
        }
        Ok(!self.failures.restore_reports_false)
    }

    fn version(&self) -> String {
        "recording".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_the_call_log() {
        let engine = RecordingEngine::new();
        let observer = engine.clone();
        engine.prepare(Path::new("/tc"), "key", false).unwrap();
        assert_eq!(observer.calls().len(), 1);
    }

    #[test]
    fn test_restore_is_idempotent() {
        let engine = RecordingEngine::new();
        assert!(engine.restore(Path::new("/tc")).unwrap());
        assert!(engine.restore(Path::new("/tc")).unwrap());
        assert_eq!(engine.calls().len(), 2);
    }

    #[test]
    fn test_failure_injection() {
        let engine = RecordingEngine::with_failures(FailureConfig {
            fail_modify: true,
            ..FailureConfig::default()
        });
        assert!(engine.modify(Path::new("/a"), Path::new("/tc"), "k").is_err());
        assert_eq!(engine.calls().len(), 1);
    }
}
