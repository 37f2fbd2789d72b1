use directories::BaseDirs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum FsError {
    #[error("{kind} not found: '{path}'", path = path.display())]
    NotFound { kind: &'static str, path: PathBuf },
    #[error("File I/O error for '{path}': {source}", path = path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl FsError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Replaces a leading `~` component with the current user's home directory.
///
/// Paths that do not start with `~` are returned unchanged, as are `~user`
/// forms, which are not supported.
pub fn expand_tilde(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match BaseDirs::new() {
            Some(dirs) => dirs.home_dir().join(rest),
            None => {
                warn!("Could not determine home directory; leaving '{}' unexpanded.", path.display());
                path.to_path_buf()
            }
        },
        Err(_) => path.to_path_buf(),
    }
}

/// Expands `~` and returns the resulting path only if it exists.
///
/// A missing path is not reported; this is the silent lookup that both
/// [`file_exists`] and [`check_exists`] are built on.
pub fn tilde_expansion(path: &Path) -> Option<PathBuf> {
    if path.as_os_str().is_empty() {
        error!("tilde_expansion: empty filename specified.");
        return None;
    }
    let expanded = expand_tilde(path);
    expanded.exists().then_some(expanded)
}

pub fn file_exists(path: &Path) -> bool {
    tilde_expansion(path).is_some()
}

/// Resolves `path` like [`tilde_expansion`] and turns a missing file into a
/// logged [`FsError::NotFound`] naming what kind of file was expected.
pub fn check_exists(kind: &'static str, path: &Path) -> Result<PathBuf, FsError> {
    tilde_expansion(path).ok_or_else(|| {
        error!("{} not found: '{}'", kind, path.display());
        FsError::NotFound {
            kind,
            path: path.to_path_buf(),
        }
    })
}

/// The name of the user running the program, as reported by the environment.
pub fn user_name() -> String {
    ["USER", "LOGNAME", "USERNAME"]
        .iter()
        .find_map(|var| std::env::var(var).ok().filter(|v| !v.is_empty()))
        .unwrap_or_else(|| "unknown".to_string())
}
