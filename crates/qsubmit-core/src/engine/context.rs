use super::error::LoadError;
use std::path::{Path, PathBuf};
use tracing::error;

/// Upper bound on the number of option files one top-level load may open.
pub const MAX_INPUT_FILES: usize = 100;

/// State shared by every nested read that originates from one top-level load.
///
/// The context counts each file opened, across `INPUT_FILE`, `ANALYZE_FILE`
/// and `ARCHIVE_FILE` alike, and keeps the chain of files currently being
/// read so that a file including any of its ancestors is rejected.
#[derive(Debug, Default)]
pub struct LoadContext {
    files_read: usize,
    ancestors: Vec<PathBuf>,
}

impl LoadContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn files_read(&self) -> usize {
        self.files_read
    }

    /// Current nesting depth.
    pub fn depth(&self) -> usize {
        self.ancestors.len()
    }

    pub fn is_ancestor(&self, resolved: &Path) -> bool {
        let key = identity(resolved);
        self.ancestors.iter().any(|p| *p == key)
    }

    /// Records that `resolved` is being opened.
    pub(crate) fn enter(&mut self, resolved: &Path) -> Result<(), LoadError> {
        self.files_read += 1;
        if self.files_read > MAX_INPUT_FILES {
            error!(
                "Number of input files read > {}; possible infinite recursion.",
                MAX_INPUT_FILES
            );
            return Err(LoadError::RecursionLimit {
                limit: MAX_INPUT_FILES,
            });
        }
        self.ancestors.push(identity(resolved));
        Ok(())
    }

    pub(crate) fn leave(&mut self) {
        self.ancestors.pop();
    }
}

/// The path used to compare files: canonical when the file can be resolved.
fn identity(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn enter_and_leave_track_ancestors() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.in");
        let b = dir.path().join("b.in");
        fs::write(&a, "").unwrap();
        fs::write(&b, "").unwrap();

        let mut ctx = LoadContext::new();
        ctx.enter(&a).unwrap();
        ctx.enter(&b).unwrap();
        assert_eq!(ctx.depth(), 2);
        assert!(ctx.is_ancestor(&a));
        assert!(ctx.is_ancestor(&dir.path().join(".").join("a.in")));

        ctx.leave();
        assert!(!ctx.is_ancestor(&b));
        assert_eq!(ctx.files_read(), 2);
    }

    #[test]
    fn enter_fails_past_the_file_limit() {
        let mut ctx = LoadContext::new();
        let path = Path::new("/nonexistent/queue.in");
        for _ in 0..MAX_INPUT_FILES {
            ctx.enter(path).unwrap();
            ctx.leave();
        }
        assert!(matches!(
            ctx.enter(path),
            Err(LoadError::RecursionLimit { limit: MAX_INPUT_FILES })
        ));
    }
}
