use crate::core::io::paths::FsError;
use crate::core::io::text::TextReader;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The exchange category of a replica dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExchangeType {
    None,
    Temperature,
    Hamiltonian,
}

impl ExchangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExchangeType::None => "NONE",
            ExchangeType::Temperature => "TEMPERATURE",
            ExchangeType::Hamiltonian => "HAMILTONIAN",
        }
    }
}

impl fmt::Display for ExchangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum DimensionError {
    #[error(transparent)]
    Fs(#[from] FsError),

    #[error("Error reading {what} from dimension file '{path}' (line {line}): '{content}'", path = path.display())]
    Parse {
        what: &'static str,
        path: PathBuf,
        line: usize,
        content: String,
    },

    #[error("Dimension file '{path}' contains no replicas", path = path.display())]
    Empty { path: PathBuf },

    #[error("Unrecognized replica dimension key '{0}'")]
    UnknownKey(String),

    #[error("Replica index {index} out of range for a dimension with {size} replicas")]
    IndexOutOfRange { index: usize, size: usize },

    #[error("Failed to write simulation input fragment: {0}")]
    Write(#[from] std::io::Error),
}

/// One parameter axis of a replica-exchange ensemble.
///
/// A dimension is created empty (usually through
/// [`ReplicaAllocator`](super::allocator::ReplicaAllocator)), filled once by
/// [`load_dim`](ReplicaDimension::load_dim), and only queried afterwards. Its
/// replica count is the number of data rows in the dimension file.
pub trait ReplicaDimension: fmt::Debug + Send + Sync {
    /// The registry key this dimension is allocated under.
    fn key(&self) -> &'static str;

    fn exchange_type(&self) -> ExchangeType;

    /// Human-readable summary, available after a successful load.
    fn description(&self) -> &str;

    /// Number of replicas along this dimension.
    fn size(&self) -> usize;

    /// Parses a dimension file. The first line is a header and is skipped;
    /// every following non-blank line describes one replica.
    fn load_dim(&mut self, path: &Path) -> Result<(), DimensionError>;

    /// Writes the simulation-input lines for replica `idx`.
    fn write_mdin(&self, idx: usize, writer: &mut dyn Write) -> Result<(), DimensionError>;

    /// Extra groupfile arguments contributed by this dimension for the
    /// replica whose groupfile extension is `ext`. Dimensions that look up
    /// per-replica data read `ext` as the decimal replica index.
    fn groupline(&self, _ext: &str) -> String {
        String::new()
    }

    /// Per-replica topology, for dimensions that vary it.
    fn topology(&self, _idx: usize) -> Option<&Path> {
        None
    }
}

pub(crate) fn check_index(index: usize, size: usize) -> Result<(), DimensionError> {
    if index < size {
        Ok(())
    } else {
        Err(DimensionError::IndexOutOfRange { index, size })
    }
}

/// A data row of a dimension file together with its one-based line number.
pub(crate) struct DataRow {
    pub line: usize,
    pub content: String,
}

impl DataRow {
    pub fn parse_error(&self, what: &'static str, path: &Path) -> DimensionError {
        DimensionError::Parse {
            what,
            path: path.to_path_buf(),
            line: self.line,
            content: self.content.clone(),
        }
    }
}

/// Reads every data row of a dimension file, skipping the header line and
/// blank lines. A file without data rows is an error.
pub(crate) fn read_data_rows(path: &Path) -> Result<Vec<DataRow>, DimensionError> {
    let mut reader = TextReader::open(path)?;
    reader.next_line()?;
    let mut rows = Vec::new();
    while let Some(content) = reader.next_line()? {
        if content.trim().is_empty() {
            continue;
        }
        rows.push(DataRow {
            line: reader.line_number(),
            content,
        });
    }
    if rows.is_empty() {
        return Err(DimensionError::Empty {
            path: path.to_path_buf(),
        });
    }
    Ok(rows)
}
