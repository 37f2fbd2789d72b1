use super::paths::FsError;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Reads a text file one line at a time.
///
/// Lines are returned without their trailing `\r`/`\n` characters, and the
/// end of the file is signalled by `Ok(None)`. The reader remembers the path
/// and the current line number so that callers can report parse failures
/// precisely.
pub struct TextReader<R> {
    reader: R,
    path: PathBuf,
    line_number: usize,
    buffer: String,
}

impl TextReader<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self, FsError> {
        let file = File::open(path).map_err(|e| FsError::io(path, e))?;
        Ok(Self::new(BufReader::new(file), path))
    }
}

impl<R: BufRead> TextReader<R> {
    pub fn new(reader: R, path: impl Into<PathBuf>) -> Self {
        Self {
            reader,
            path: path.into(),
            line_number: 0,
            buffer: String::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// One-based number of the line most recently returned.
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    pub fn next_line(&mut self) -> Result<Option<String>, FsError> {
        self.buffer.clear();
        let read = self
            .reader
            .read_line(&mut self.buffer)
            .map_err(|e| FsError::io(&self.path, e))?;
        if read == 0 {
            return Ok(None);
        }
        self.line_number += 1;
        let trimmed = self.buffer.trim_end_matches(['\r', '\n']);
        Ok(Some(trimmed.to_string()))
    }
}

/// Reads a whole file verbatim.
pub fn read_all(path: &Path) -> Result<String, FsError> {
    std::fs::read_to_string(path).map_err(|e| FsError::io(path, e))
}
