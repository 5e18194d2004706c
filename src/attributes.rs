//! Platform file attributes.

use std::fs;
use std::io;
use std::path::Path;

#[cfg(not(unix))]
use tracing::trace;

/// Apply archive mode bits to an extracted file. `0` leaves the default.
///
/// On Unix only the owner/group/other rwx bits are kept; setuid (0o4000),
/// setgid (0o2000) and sticky (0o1000) are dropped. Elsewhere a cleared
/// owner-write bit maps to the read-only attribute.
pub fn apply_mode(path: &Path, mode: u32) -> io::Result<()> {
    if mode == 0 {
        return Ok(());
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let safe_mode = mode & 0o0777;
        fs::set_permissions(path, fs::Permissions::from_mode(safe_mode))
    }

    #[cfg(not(unix))]
    {
        let mut permissions = match fs::metadata(path) {
            Ok(m) => m.permissions(),
            Err(e) if e.kind() == io::ErrorKind::Unsupported => {
                trace!(path = %path.display(), "attributes not supported here");
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        permissions.set_readonly(mode & 0o200 == 0);
        match fs::set_permissions(path, permissions) {
            Err(e) if e.kind() == io::ErrorKind::Unsupported => {
                trace!(path = %path.display(), "attributes not supported here");
                Ok(())
            }
            other => other,
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    #[test]
    fn mode_strips_special_bits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tool");
        fs::write(&path, b"#!/bin/sh").unwrap();

        apply_mode(&path, 0o4755).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o7777, 0o755);
    }

    #[test]
    fn zero_mode_is_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain");
        fs::write(&path, b"x").unwrap();
        let before = fs::metadata(&path).unwrap().permissions().mode();

        apply_mode(&path, 0).unwrap();
        assert_eq!(fs::metadata(&path).unwrap().permissions().mode(), before);
    }
}
