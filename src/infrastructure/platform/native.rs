//! Native host signals
//!
//! The codec engine is an external ffmpeg process. It can run when the
//! binary resolves to an executable and it has a writable scratch area.

use std::path::{Path, PathBuf};

use crate::application::ports::PlatformSignals;

pub struct NativePlatform {
    ffmpeg_path: String,
}

impl NativePlatform {
    pub fn new(ffmpeg_path: impl Into<String>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
        }
    }
}

impl PlatformSignals for NativePlatform {
    fn is_isolated(&self) -> bool {
        resolve_binary(&self.ffmpeg_path).is_some()
    }

    fn shared_memory_available(&self) -> bool {
        temp_dir_writable()
    }
}

/// Resolve `name` the way a shell would: paths as given, bare names via `PATH`
pub fn resolve_binary(name: &str) -> Option<PathBuf> {
    let candidate = Path::new(name);
    if candidate.components().count() > 1 || candidate.is_absolute() {
        return is_executable(candidate).then(|| candidate.to_path_buf());
    }

    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .flat_map(|dir| {
            let plain = dir.join(name);
            let exe = dir.join(format!("{}.exe", name));
            [plain, exe]
        })
        .find(|path| is_executable(path))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

fn temp_dir_writable() -> bool {
    let probe = std::env::temp_dir().join(format!(".audio-qr-probe-{}", std::process::id()));
    let writable = std::fs::write(&probe, b"").is_ok();
    let _ = std::fs::remove_file(&probe);
    writable
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_binary_is_not_isolated() {
        let platform = NativePlatform::new("/nonexistent/ffmpeg-audio-qr");
        assert!(!platform.is_isolated());
        assert!(resolve_binary("definitely-not-a-real-binary-audio-qr").is_none());
    }

    #[test]
    fn temp_dir_is_writable() {
        assert!(NativePlatform::new("ffmpeg").shared_memory_available());
    }

    #[cfg(unix)]
    #[test]
    fn explicit_path_must_be_executable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake-ffmpeg");
        std::fs::write(&path, b"#!/bin/sh\n").unwrap();
        assert!(resolve_binary(path.to_str().unwrap()).is_none());

        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        assert_eq!(resolve_binary(path.to_str().unwrap()), Some(path));
    }
}
