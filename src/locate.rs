//! Metadata artifact and build-cache path computation
//!
//! The artifact lands in a different place per platform family. Desktop
//! builds put it under the `_Data` directory next to the build output;
//! Android builds put it inside the generated project module, whose path is
//! only known at the project-generation callback, not at build start.

use std::fs;
use std::path::{Path, PathBuf};

/// File name of the AOT type-metadata artifact
pub const METADATA_FILE: &str = "global-metadata.dat";

/// Suffix of the data directory that sits next to a desktop build output
const DATA_DIR_SUFFIX: &str = "_Data";

/// Path to the metadata artifact of a desktop build
///
/// The artifact sits under the data directory derived from the build output
/// path, with the output's extension replaced by the `_Data` suffix:
/// `Game.exe` -> `Game_Data/aot_data/Metadata/global-metadata.dat`.
pub fn desktop_artifact(output_path: &Path) -> PathBuf {
    let stem = output_path
        .file_stem()
        .unwrap_or_default()
        .to_string_lossy()
        .into_owned();
    output_path
        .with_file_name(format!("{stem}{DATA_DIR_SUFFIX}"))
        .join("aot_data")
        .join("Metadata")
        .join(METADATA_FILE)
}

/// Path to the metadata artifact inside a generated Android project module
///
/// `module_path` is the module directory the host reports from its
/// project-generation callback, not the final build output.
pub fn mobile_artifact(module_path: &Path) -> PathBuf {
    module_path
        .join("src")
        .join("main")
        .join("assets")
        .join("bin")
        .join("Data")
        .join("Managed")
        .join("Metadata")
        .join(METADATA_FILE)
}

/// Directory where an interrupted Android build may have left a generated
/// project outside the normal output tree
pub fn mobile_build_cache(project_root: &Path) -> PathBuf {
    project_root
        .join("Library")
        .join("Aot")
        .join("Android")
        .join("Gradle")
        .join("mainLibrary")
}

/// Delete the stale Android build cache if a previous build left one behind
///
/// A leftover cache silently breaks subsequent incremental builds, so it is
/// purged at the start of every build whether or not protection runs.
pub fn purge_stale_cache(project_root: &Path) {
    let cache = mobile_build_cache(project_root);
    if !cache.exists() {
        return;
    }
    match fs::remove_dir_all(&cache) {
        Ok(()) => tracing::info!("purged stale build cache at \"{}\"", cache.display()),
        Err(e) => tracing::warn!(
            "failed to purge stale build cache at \"{}\": {}",
            cache.display(),
            e
        ),
    }
}
