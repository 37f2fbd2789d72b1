use crate::core::io::paths::FsError;
use crate::core::queue::options::{OptionError, ValidationError};
use crate::core::queue::script::ScriptError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Fs(#[from] FsError),

    #[error("Malformed option on line {line} of '{path}': '{content}'", path = path.display())]
    Malformed {
        path: PathBuf,
        line: usize,
        content: String,
    },

    #[error("An input file may not read from itself ('{path}')", path = path.display())]
    SelfReference { path: PathBuf },

    #[error("Number of input files read exceeds {limit}; possible infinite recursion")]
    RecursionLimit { limit: usize },

    #[error("Only one {directive} allowed")]
    Duplicate { directive: &'static str },

    #[error("Error on line {line} of '{path}': {source}", path = path.display())]
    InvalidOption {
        path: PathBuf,
        line: usize,
        #[source]
        source: OptionError,
    },

    #[error("Invalid {profile} options: {source}")]
    Validation {
        profile: &'static str,
        #[source]
        source: ValidationError,
    },
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Fs(#[from] FsError),

    #[error(transparent)]
    Script(#[from] ScriptError),

    #[error("Not overwriting and '{dir}' already contains {script}", dir = dir.display())]
    ScriptExists { dir: PathBuf, script: String },

    #[error("groupfile does not exist for '{dir}'", dir = dir.display())]
    MissingGroupfile { dir: PathBuf },

    #[error("No ANALYZE_FILE set")]
    NoAnalysisProfile,

    #[error("Submitting '{script}' failed: {message}", script = script.display())]
    Submission { script: PathBuf, message: String },

    #[error("Failed to serialize queue options: {0}")]
    Serialize(#[from] toml::ser::Error),
}
