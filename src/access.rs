//! Toolchain write-access probing and elevation
//!
//! Metadata-reported permissions are unreliable across platforms and
//! filesystems, so access is verified functionally: the probe exercises the
//! full create/write/read/rename/delete cycle inside a scratch directory.
//! When the probe fails on an interactive Windows session, an elevated
//! `icacls` grant is attempted; everywhere else a failed probe is final.

use crate::{ShieldError, ShieldResult};
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use std::fs;
use std::path::Path;

/// Name of the scratch directory used by the probe; left behind only if a
/// probe step fails midway, and safe to delete at any time
const SCRATCH_DIR: &str = "DELETE_ME";

/// Check write access to `dir` by performing real filesystem operations
///
/// Creates a scratch directory, writes a one-byte file with a random name,
/// reads it back, renames it, deletes it, and removes the scratch directory.
/// Returns `false` as soon as any step fails.
pub fn has_write_access(dir: &Path) -> bool {
    let scratch = dir.join(SCRATCH_DIR);
    let name: String = thread_rng()
        .sample_iter(&Alphanumeric)
        .take(12)
        .map(char::from)
        .collect();
    let file = scratch.join(name);

    if fs::create_dir_all(&scratch).is_err() {
        return false;
    }
    if fs::write(&file, [1u8]).is_err() {
        return false;
    }
    if fs::read(&file).is_err() {
        return false;
    }
    let mut renamed = file.clone().into_os_string();
    renamed.push("a");
    if fs::rename(&file, &renamed).is_err() {
        return false;
    }
    if fs::remove_file(&renamed).is_err() {
        return false;
    }
    fs::remove_dir(&scratch).is_ok()
}

/// Verify write access to `dir`, attempting elevation if needed
///
/// On probe failure: non-Windows platforms and non-interactive (batch)
/// sessions get [`ShieldError::AccessDenied`] immediately; protection must
/// never hang an unattended build on a prompt. On interactive Windows an
/// elevated grant is attempted and the probe re-run; dismissal of the
/// elevation prompt yields [`ShieldError::ElevationCancelled`].
pub fn ensure_write_access(dir: &Path, interactive: bool) -> ShieldResult<()> {
    if has_write_access(dir) {
        return Ok(());
    }
    if !cfg!(windows) || !interactive {
        return Err(ShieldError::AccessDenied(dir.to_path_buf()));
    }
    #[cfg(windows)]
    {
        grant_access(dir)?;
        if has_write_access(dir) {
            return Ok(());
        }
    }
    Err(ShieldError::AccessDenied(dir.to_path_buf()))
}

/// Grant the current user recursive full control over `dir` via an elevated
/// shell, blocking until the spawned process exits
///
/// Build lifecycle callbacks are synchronous, so the grant must be too.
#[cfg(windows)]
fn grant_access(dir: &Path) -> ShieldResult<()> {
    use std::process::Command;

    let user = whoami::username();
    tracing::info!("requesting elevated access to \"{}\"", dir.display());
    let grant = format!(
        "Start-Process -FilePath cmd.exe -ArgumentList '/C icacls \"{}\" /grant {}:(OI)(CI)F' -Verb RunAs -Wait -WindowStyle Hidden",
        dir.display(),
        user
    );
    let status = Command::new("powershell.exe")
        .args(["-NoProfile", "-NonInteractive", "-WindowStyle", "Hidden", "-Command", &grant])
        .status()?;
    if !status.success() {
        // Start-Process fails when the user dismisses the elevation prompt
        return Err(ShieldError::ElevationCancelled);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_probe_succeeds_on_writable_dir() {
        let dir = TempDir::new().unwrap();
        assert!(has_write_access(dir.path()));
    }

    #[test]
    fn test_probe_leaves_no_scratch_behind() {
        let dir = TempDir::new().unwrap();
        assert!(has_write_access(dir.path()));
        assert!(!dir.path().join(SCRATCH_DIR).exists());
    }

    /// Make `dir` read-only; `false` if permission bits do not bind the
    /// current user (e.g. root), in which case the caller should skip
    #[cfg(unix)]
    fn make_readonly(dir: &Path) -> bool {
        use std::os::unix::fs::PermissionsExt;

        let mut perms = fs::metadata(dir).unwrap().permissions();
        perms.set_mode(0o555);
        fs::set_permissions(dir, perms).unwrap();
        fs::write(dir.join("canary"), [0u8]).is_err()
    }

    #[cfg(unix)]
    #[test]
    fn test_probe_fails_on_readonly_dir() {
        let dir = TempDir::new().unwrap();
        if !make_readonly(dir.path()) {
            eprintln!("Skipping test: permission bits do not bind this user");
            return;
        }

        assert!(!has_write_access(dir.path()));
    }

    #[cfg(unix)]
    #[test]
    fn test_ensure_write_access_denied_without_elevation() {
        let dir = TempDir::new().unwrap();
        if !make_readonly(dir.path()) {
            eprintln!("Skipping test: permission bits do not bind this user");
            return;
        }

        let err = ensure_write_access(dir.path(), true).unwrap_err();
        assert!(matches!(err, ShieldError::AccessDenied(_)));
    }

    #[test]
    fn test_ensure_write_access_ok_on_writable_dir() {
        let dir = TempDir::new().unwrap();
        assert!(ensure_write_access(dir.path(), false).is_ok());
    }
}
