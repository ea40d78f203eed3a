//! Protection pipeline orchestration
//!
//! The host build system drives one [`ProtectionPipeline`] through up to
//! three lifecycle callbacks per build: build start, project generation
//! (Android only), and build finished. Minutes may pass between callbacks
//! while the host compiles; the pipeline carries its stage and the per-build
//! key across that gap and resets both when the next build starts.
//!
//! Every failure is handled locally: callbacks log and move the pipeline to
//! [`Stage::Skipped`] instead of returning errors, because an unhandled
//! fault here would abort the host's build. The one hard rule along every
//! abort path is that `restore` runs whenever `prepare` ran, so the
//! toolchain is never left patched.

use crate::access;
use crate::context::{BuildContext, PlatformGroup, TargetPlatform};
use crate::engine::TransformationEngine;
use crate::error::ShieldError;
use crate::gate;
use crate::keygen;
use crate::locate;
use crate::settings::{Settings, SettingsStore};
use std::path::{Path, PathBuf};

/// Pipeline stage within one build's lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// No work has happened for the current build yet
    Idle,
    /// The gate accepted the build
    Gated,
    /// The engine is patching the toolchain
    Preparing,
    /// Toolchain patched; waiting for the build to produce the artifact
    AwaitingArtifact,
    /// The engine is rewriting the artifact
    Modifying,
    /// The toolchain has been restored; protection is done for this build
    Restored,
    /// Protection does not apply or was aborted; later callbacks are no-ops
    Skipped,
}

impl Stage {
    /// Whether no further work happens for this build
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Restored | Stage::Skipped)
    }

    /// Check if moving from this stage to `target` is a valid transition
    pub fn can_transition_to(&self, target: Stage) -> bool {
        matches!(
            (self, target),
            (Stage::Idle, Stage::Gated)
                | (Stage::Gated, Stage::Preparing)
                | (Stage::Preparing, Stage::AwaitingArtifact)
                | (Stage::AwaitingArtifact, Stage::Modifying)
                | (Stage::Modifying, Stage::Restored)
                | (
                    Stage::Idle | Stage::Gated | Stage::Preparing | Stage::AwaitingArtifact,
                    Stage::Skipped,
                )
        )
    }
}

/// Orchestrates protection across one build's lifecycle callbacks
///
/// Holds the toolchain installation path as a shared mutable external
/// resource: `prepare` patches binaries inside it and `restore` puts them
/// back. One pipeline handles one build at a time; concurrent builds
/// sharing a toolchain installation race on prepare/restore and are not
/// supported.
pub struct ProtectionPipeline<E: TransformationEngine> {
    engine: E,
    toolchain: PathBuf,
    project_root: PathBuf,
    store: SettingsStore,
    interactive: bool,
    settings: Settings,
    stage: Stage,
    platform: Option<TargetPlatform>,
    secret: Option<String>,
}

impl<E: TransformationEngine> ProtectionPipeline<E> {
    /// Create a pipeline over the toolchain installed at `toolchain`, for
    /// the project rooted at `project_root`
    pub fn new(engine: E, toolchain: impl Into<PathBuf>, project_root: impl Into<PathBuf>) -> Self {
        Self::with_store(engine, toolchain, project_root, SettingsStore::new())
    }

    /// Create a pipeline reading settings from an explicit store
    pub fn with_store(
        engine: E,
        toolchain: impl Into<PathBuf>,
        project_root: impl Into<PathBuf>,
        store: SettingsStore,
    ) -> Self {
        // loaded here so the host can query callback_order before the
        // first callback fires
        let settings = store.load();
        Self {
            engine,
            toolchain: toolchain.into(),
            project_root: project_root.into(),
            store,
            interactive: true,
            settings,
            stage: Stage::Idle,
            platform: None,
            secret: None,
        }
    }

    /// Whether the host session can show an elevation prompt
    ///
    /// Batch/headless sessions must pass `false`; a failed access probe then
    /// aborts protection instead of waiting on a prompt nobody will answer.
    pub fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    /// Current pipeline stage
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Ordering of this pipeline among the host's build callbacks
    pub fn callback_order(&self) -> i32 {
        self.settings.callback_order
    }

    /// Version string of the attached engine, for display
    pub fn engine_version(&self) -> String {
        self.engine.version()
    }

    /// Build-start callback
    ///
    /// Resets per-build state, purges the stale build cache, and when the
    /// build qualifies: verifies toolchain write access, generates the
    /// per-build key, and has the engine patch the toolchain.
    pub fn on_build_start(&mut self, ctx: &BuildContext) {
        self.settings = self.store.load();
        self.stage = Stage::Idle;
        self.secret = None;
        self.platform = Some(ctx.platform);
        tracing::debug!(engine = %self.engine.version(), "build started");

        locate::purge_stale_cache(&self.project_root);

        if !gate::should_protect(ctx, &self.settings) {
            tracing::info!("ignoring this build");
            self.skip();
            return;
        }
        self.transition(Stage::Gated);

        if let Err(e) = access::ensure_write_access(&self.toolchain, self.interactive) {
            tracing::error!("{e}");
            self.skip();
            return;
        }

        self.transition(Stage::Preparing);
        let secret = keygen::generate_key();
        // the experimental layers need a native runtime only the Windows
        // target ships
        let experimental =
            self.settings.experimental && ctx.platform == TargetPlatform::Windows64;
        if let Err(e) = self.engine.prepare(&self.toolchain, &secret, experimental) {
            tracing::error!("prepare failed: {e:#}");
            self.restore_toolchain();
            self.skip();
            return;
        }
        self.secret = Some(secret);
        self.transition(Stage::AwaitingArtifact);
    }

    /// Project-generation callback (Android)
    ///
    /// Fires for every Android build, protected or not; the stage decides
    /// whether there is work to do. `module_path` is the generated project
    /// module, the only place the Android artifact path can be derived
    /// from. The build-finished callback fires after this one and must not
    /// repeat the modification.
    pub fn on_project_generated(&mut self, module_path: &Path) {
        if self.stage != Stage::AwaitingArtifact {
            return;
        }
        if self.platform.map(|p| p.group()) != Some(PlatformGroup::Mobile) {
            return;
        }
        let artifact = locate::mobile_artifact(module_path);
        self.modify_and_restore(&artifact);
    }

    /// Build-finished callback
    ///
    /// Desktop builds resolve and rewrite their artifact here. Mobile
    /// builds were handled at project generation, which leaves the stage
    /// terminal and makes this a no-op.
    pub fn on_build_finished(&mut self, ctx: &BuildContext) {
        if self.stage != Stage::AwaitingArtifact {
            return;
        }
        if ctx.platform.group() == PlatformGroup::Mobile {
            // the project-generation callback should have consumed this
            // build; do not leave the toolchain patched
            tracing::warn!("mobile build finished without a generated project");
            self.restore_toolchain();
            self.skip();
            return;
        }
        if !ctx.outcome.is_good() {
            // the build died after prepare; put the toolchain back
            tracing::warn!("build did not succeed; restoring toolchain");
            self.restore_toolchain();
            self.skip();
            return;
        }
        let artifact = locate::desktop_artifact(&ctx.output_path);
        self.modify_and_restore(&artifact);
    }

    /// Restore the toolchain right now, independent of any build
    ///
    /// Operator-facing: safe to call at any time, including when nothing
    /// was modified.
    pub fn restore_now(&self) -> bool {
        match self.engine.restore(&self.toolchain) {
            Ok(true) => {
                tracing::info!("restored original toolchain files");
                true
            }
            Ok(false) => {
                tracing::warn!("the original toolchain files could not be restored");
                false
            }
            Err(e) => {
                tracing::error!("restore failed: {e:#}");
                false
            }
        }
    }

    /// Rewrite the artifact and restore the toolchain
    ///
    /// Reaching this point means `prepare` ran, so `restore` is issued on
    /// every path out of here, including artifact-missing and a failed
    /// `modify`.
    fn modify_and_restore(&mut self, artifact: &Path) {
        if !artifact.is_file() {
            let err = ShieldError::ArtifactMissing(artifact.to_path_buf());
            tracing::error!("{err}");
            self.restore_toolchain();
            self.skip();
            return;
        }
        let Some(secret) = self.secret.clone() else {
            tracing::error!("no key was generated for this build");
            self.restore_toolchain();
            self.skip();
            return;
        };
        self.transition(Stage::Modifying);
        if let Err(e) = self.engine.modify(artifact, &self.toolchain, &secret) {
            tracing::error!("modify failed: {e:#}");
        }
        self.restore_toolchain();
        self.transition(Stage::Restored);
    }

    fn restore_toolchain(&self) {
        match self.engine.restore(&self.toolchain) {
            Ok(true) => {}
            Ok(false) => tracing::warn!("the original toolchain files could not be restored"),
            Err(e) => tracing::error!("restore failed: {e:#}"),
        }
    }

    fn skip(&mut self) {
        self.transition(Stage::Skipped);
    }

    fn transition(&mut self, target: Stage) {
        if !self.stage.can_transition_to(target) {
            tracing::warn!("unexpected stage transition {:?} -> {:?}", self.stage, target);
        }
        tracing::debug!("stage {:?} -> {:?}", self.stage, target);
        self.stage = target;
    }
}
