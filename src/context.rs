//! Build metadata supplied by the host build system
//!
//! One [`BuildContext`] is created by the host per build and is read-only to
//! this crate. The pipeline never outlives the metadata it was given: every
//! field is copied out of the host's own build report at callback time.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Build target platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetPlatform {
    Windows64,
    Linux64,
    MacOs,
    Android,
    Ios,
    WebGl,
}

impl TargetPlatform {
    /// The platform group this target belongs to
    pub fn group(&self) -> PlatformGroup {
        match self {
            TargetPlatform::Windows64 | TargetPlatform::Linux64 | TargetPlatform::MacOs => {
                PlatformGroup::Desktop
            }
            TargetPlatform::Android | TargetPlatform::Ios => PlatformGroup::Mobile,
            TargetPlatform::WebGl => PlatformGroup::Web,
        }
    }
}

/// Coarse platform family; compiler backends are configured per group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformGroup {
    Desktop,
    Mobile,
    Web,
}

/// Compiler backend active for a build
///
/// Only the ahead-of-time backend emits the metadata artifact this crate
/// protects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompilerBackend {
    /// Translate-to-native, ahead-of-time compilation
    Aot,
    /// Managed/JIT execution; produces no metadata artifact
    Jit,
}

/// Build outcome as reported by the host
///
/// `Unknown` is the normal value at build start, before the host knows how
/// the build will end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildOutcome {
    Unknown,
    Succeeded,
    Failed,
    Cancelled,
}

impl BuildOutcome {
    /// Whether the build has not failed or been cancelled
    pub fn is_good(&self) -> bool {
        !matches!(self, BuildOutcome::Failed | BuildOutcome::Cancelled)
    }
}

/// Per-build metadata from the host build system
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildContext {
    /// Target platform of this build
    pub platform: TargetPlatform,
    /// Platform group the target belongs to
    pub platform_group: PlatformGroup,
    /// Compiler backend active for the platform group
    pub backend: CompilerBackend,
    /// Build outcome; `Unknown` until the build finishes
    pub outcome: BuildOutcome,
    /// Path of the build's primary output
    pub output_path: PathBuf,
}

impl BuildContext {
    /// Create a context for the given target; the platform group is derived
    /// from the platform
    pub fn new(
        platform: TargetPlatform,
        backend: CompilerBackend,
        outcome: BuildOutcome,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            platform,
            platform_group: platform.group(),
            backend,
            outcome,
            output_path: output_path.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_groups() {
        assert_eq!(TargetPlatform::Windows64.group(), PlatformGroup::Desktop);
        assert_eq!(TargetPlatform::Linux64.group(), PlatformGroup::Desktop);
        assert_eq!(TargetPlatform::MacOs.group(), PlatformGroup::Desktop);
        assert_eq!(TargetPlatform::Android.group(), PlatformGroup::Mobile);
        assert_eq!(TargetPlatform::Ios.group(), PlatformGroup::Mobile);
        assert_eq!(TargetPlatform::WebGl.group(), PlatformGroup::Web);
    }

    #[test]
    fn test_outcome_is_good() {
        assert!(BuildOutcome::Unknown.is_good());
        assert!(BuildOutcome::Succeeded.is_good());
        assert!(!BuildOutcome::Failed.is_good());
        assert!(!BuildOutcome::Cancelled.is_good());
    }

    #[test]
    fn test_context_derives_group() {
        let ctx = BuildContext::new(
            TargetPlatform::Android,
            CompilerBackend::Aot,
            BuildOutcome::Unknown,
            "/builds/game.apk",
        );
        assert_eq!(ctx.platform_group, PlatformGroup::Mobile);
    }
}
