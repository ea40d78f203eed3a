//! Build applicability gate
//!
//! Decides whether protection applies to a build at all. Runs at the very
//! start of the build, before any destructive action, and must stay cheap
//! and side-effect-free.

use crate::context::{BuildContext, CompilerBackend, TargetPlatform};
use crate::settings::Settings;

/// Whether protection applies to this build
///
/// All of the following must hold:
/// - settings have protection enabled
/// - the build has not already failed or been cancelled
/// - the platform group's compiler backend is the AOT backend (only that
///   backend emits the metadata artifact)
/// - the target platform is one of Windows64, Linux64, Android
///
/// Builds compiled with the `server` cargo feature are never protected:
/// headless server builds do not ship reflection metadata in a form worth
/// protecting and must never block on permission prompts.
pub fn should_protect(ctx: &BuildContext, settings: &Settings) -> bool {
    if cfg!(feature = "server") {
        return false;
    }
    settings.enable && ctx.outcome.is_good() && is_aot(ctx) && is_supported(ctx.platform)
}

fn is_aot(ctx: &BuildContext) -> bool {
    ctx.backend == CompilerBackend::Aot
}

fn is_supported(platform: TargetPlatform) -> bool {
    matches!(
        platform,
        TargetPlatform::Windows64 | TargetPlatform::Linux64 | TargetPlatform::Android
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::BuildOutcome;

    fn ctx(
        platform: TargetPlatform,
        backend: CompilerBackend,
        outcome: BuildOutcome,
    ) -> BuildContext {
        BuildContext::new(platform, backend, outcome, "/builds/out/Game.exe")
    }

    const ALL_PLATFORMS: [TargetPlatform; 6] = [
        TargetPlatform::Windows64,
        TargetPlatform::Linux64,
        TargetPlatform::MacOs,
        TargetPlatform::Android,
        TargetPlatform::Ios,
        TargetPlatform::WebGl,
    ];

    #[cfg(not(feature = "server"))]
    #[test]
    fn test_allow_listed_platforms_pass() {
        let settings = Settings::default();
        for platform in [
            TargetPlatform::Windows64,
            TargetPlatform::Linux64,
            TargetPlatform::Android,
        ] {
            let ctx = ctx(platform, CompilerBackend::Aot, BuildOutcome::Unknown);
            assert!(should_protect(&ctx, &settings), "{platform:?} should pass");
        }
    }

    #[cfg(not(feature = "server"))]
    #[test]
    fn test_unsupported_platforms_skip() {
        let settings = Settings::default();
        for platform in [
            TargetPlatform::MacOs,
            TargetPlatform::Ios,
            TargetPlatform::WebGl,
        ] {
            let ctx = ctx(platform, CompilerBackend::Aot, BuildOutcome::Unknown);
            assert!(!should_protect(&ctx, &settings), "{platform:?} should skip");
        }
    }

    #[test]
    fn test_jit_backend_skips_everywhere() {
        let settings = Settings::default();
        for platform in ALL_PLATFORMS {
            let ctx = ctx(platform, CompilerBackend::Jit, BuildOutcome::Unknown);
            assert!(!should_protect(&ctx, &settings));
        }
    }

    #[test]
    fn test_bad_outcomes_skip() {
        let settings = Settings::default();
        for outcome in [BuildOutcome::Failed, BuildOutcome::Cancelled] {
            for platform in ALL_PLATFORMS {
                let ctx = ctx(platform, CompilerBackend::Aot, outcome);
                assert!(!should_protect(&ctx, &settings));
            }
        }
    }

    #[test]
    fn test_disabled_settings_skip() {
        let settings = Settings {
            enable: false,
            ..Settings::default()
        };
        let ctx = ctx(
            TargetPlatform::Windows64,
            CompilerBackend::Aot,
            BuildOutcome::Unknown,
        );
        assert!(!should_protect(&ctx, &settings));
    }

    #[cfg(feature = "server")]
    #[test]
    fn test_server_builds_never_protect() {
        let settings = Settings::default();
        let ctx = ctx(
            TargetPlatform::Windows64,
            CompilerBackend::Aot,
            BuildOutcome::Unknown,
        );
        assert!(!should_protect(&ctx, &settings));
    }
}
