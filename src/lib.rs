//! Metashield - Build-Time Metadata Protection
//!
//! Protects the AOT type-metadata artifact a build toolchain emits so that
//! reverse-engineering tools cannot trivially read it, and restores the
//! toolchain's own files to their original state afterward. The byte-level
//! transformation is performed by an external native engine; this crate is
//! the pipeline that drives that engine exactly once per qualifying build,
//! on the right file, with the right key, with correct cleanup.
//!
//! ## Lifecycle
//!
//! The host build system invokes the pipeline at up to three points spread
//! over a build that may take minutes and may fail or be cancelled between
//! them:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │ build start                                                      │
//! ├──────────────────────────────────────────────────────────────────┤
//! │ purge stale cache ─► gate ─► access check ─► key ─► prepare      │
//! │                       │          │                    │          │
//! │                       ▼          ▼                    ▼          │
//! │                    Skipped    Skipped          AwaitingArtifact  │
//! └──────────────────────────────────────────────────────────────────┘
//!
//! ┌──────────────────────────────────────────────────────────────────┐
//! │ project generated (Android only)    │ build finished (desktop)   │
//! ├──────────────────────────────────────────────────────────────────┤
//! │ locate artifact ─► modify ─► restore ─► Restored                 │
//! │        │                                                         │
//! │        ▼                                                         │
//! │ restore ─► Skipped (artifact missing)                            │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Desktop targets expose only build start and build finished; Android adds
//! the project-generation point, the only callback from which the Android
//! artifact path can be derived. Whichever shape the platform offers,
//! `restore` runs whenever `prepare` ran, so the toolchain is never left
//! patched, even for aborted or failed builds.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use metashield::{BuildContext, NativeToolEngine, ProtectionPipeline};
//! use metashield::{BuildOutcome, CompilerBackend, TargetPlatform};
//!
//! let mut pipeline = ProtectionPipeline::new(
//!     NativeToolEngine::default(),
//!     "/opt/toolchain/2023.2",
//!     "/work/project",
//! );
//!
//! // wired into the host's build callbacks, in callback_order() position:
//! let ctx = BuildContext::new(
//!     TargetPlatform::Windows64,
//!     CompilerBackend::Aot,
//!     BuildOutcome::Unknown,
//!     "/work/project/Builds/Game.exe",
//! );
//! pipeline.on_build_start(&ctx);
//! // ... host compiles ...
//! pipeline.on_build_finished(&BuildContext {
//!     outcome: BuildOutcome::Succeeded,
//!     ..ctx
//! });
//! ```
//!
//! One pipeline handles one build at a time. Concurrent builds sharing a
//! toolchain installation race on prepare/restore and are not supported.

pub mod access;
mod context;
pub mod engine;
mod error;
mod gate;
pub mod keygen;
pub mod locate;
pub mod mock;
mod pipeline;
mod settings;

pub use context::{BuildContext, BuildOutcome, CompilerBackend, PlatformGroup, TargetPlatform};
pub use engine::{NativeToolEngine, TransformationEngine, DEFAULT_PROGRAM};
pub use error::{ShieldError, ShieldResult};
pub use gate::should_protect;
pub use mock::{EngineCall, FailureConfig, RecordingEngine};
pub use pipeline::{ProtectionPipeline, Stage};
pub use settings::{Settings, SettingsStore};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
