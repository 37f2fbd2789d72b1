use crate::core::io::paths::{self, FsError};
use crate::core::io::text;
use phf::{Map, phf_map};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, warn};

/// The kind of job a submission profile describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RunType {
    #[serde(rename = "MD")]
    Md,
    #[serde(rename = "TREMD")]
    TemperatureReplica,
    #[serde(rename = "HREMD")]
    HamiltonianReplica,
    #[serde(rename = "MREMD")]
    MultiReplica,
    #[serde(rename = "ANALYSIS")]
    Analysis,
    #[serde(rename = "ARCHIVE")]
    Archive,
}

static RUN_TYPES: Map<&'static str, RunType> = phf_map! {
    "MD" => RunType::Md,
    "TREMD" => RunType::TemperatureReplica,
    "HREMD" => RunType::HamiltonianReplica,
    "MREMD" => RunType::MultiReplica,
    "ANALYSIS" => RunType::Analysis,
    "ARCHIVE" => RunType::Archive,
};

impl RunType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunType::Md => "MD",
            RunType::TemperatureReplica => "TREMD",
            RunType::HamiltonianReplica => "HREMD",
            RunType::MultiReplica => "MREMD",
            RunType::Analysis => "ANALYSIS",
            RunType::Archive => "ARCHIVE",
        }
    }

    /// Whether runs of this type drive many replicas through a groupfile.
    pub fn is_replica_exchange(&self) -> bool {
        matches!(
            self,
            RunType::TemperatureReplica | RunType::HamiltonianReplica | RunType::MultiReplica
        )
    }
}

impl FromStr for RunType {
    type Err = OptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RUN_TYPES
            .get(s)
            .copied()
            .ok_or_else(|| OptionError::UnrecognizedValue {
                option: "RUNTYPE",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for RunType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The batch scheduler a script is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum QueueType {
    #[serde(rename = "PBS")]
    Pbs,
    #[serde(rename = "SBATCH")]
    Sbatch,
}

static QUEUE_TYPES: Map<&'static str, QueueType> = phf_map! {
    "PBS" => QueueType::Pbs,
    "SBATCH" => QueueType::Sbatch,
};

impl QueueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueType::Pbs => "PBS",
            QueueType::Sbatch => "SBATCH",
        }
    }

    /// The command used to hand a script to this scheduler. Generated scripts
    /// are named after it (`qsub.sh`, `sbatch.sh`).
    pub fn submit_command(&self) -> &'static str {
        match self {
            QueueType::Pbs => "qsub",
            QueueType::Sbatch => "sbatch",
        }
    }

    pub fn script_name(&self) -> String {
        format!("{}.sh", self.submit_command())
    }
}

impl FromStr for QueueType {
    type Err = OptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QUEUE_TYPES
            .get(s)
            .copied()
            .ok_or_else(|| OptionError::UnrecognizedValue {
                option: "QSUB",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for QueueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How consecutive jobs are chained together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DependType {
    /// The dependency is written into the script as a scheduler directive.
    #[serde(rename = "BATCH")]
    Batch,
    /// The dependency is handled by whoever submits the scripts.
    #[serde(rename = "SUBMIT")]
    Submit,
}

impl DependType {
    fn code(&self) -> u8 {
        match self {
            DependType::Batch => 0,
            DependType::Submit => 1,
        }
    }
}

#[derive(Debug, Error)]
pub enum OptionError {
    #[error("Unrecognized option '{0}' in input file")]
    UnrecognizedOption(String),
    #[error("Unrecognized {option}: '{value}'")]
    UnrecognizedValue { option: &'static str, value: String },
    #[error("Invalid integer value for {option}: '{value}'")]
    InvalidInteger { option: &'static str, value: String },
    #[error(transparent)]
    Fs(#[from] FsError),
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ValidationError {
    #[error("No job name (JOBNAME) specified")]
    NoJobName,
    #[error("PROGRAM not specified")]
    NoProgram,
    #[error("MPI run command MPIRUN not set")]
    NoMpiRun,
}

/// One job-submission profile: resources, scheduler and program settings.
///
/// Profiles start out empty ([`QueueOptions::default`]) and are filled one
/// option at a time by [`QueueOptions::process_option`], normally driven by
/// the option-file loader. Once loaded they are validated with
/// [`QueueOptions::check`] and treated as read-only, apart from the derived
/// thread count ([`QueueOptions::calc_threads`]) and the run-type override
/// applied to analysis profiles.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct QueueOptions {
    job_name: String,
    nodes: i32,
    ng: i32,
    ppn: i32,
    threads: i32,
    run_type: RunType,
    #[serde(skip_serializing_if = "Option::is_none")]
    amberhome: Option<PathBuf>,
    program: String,
    queue_type: QueueType,
    #[serde(skip_serializing_if = "String::is_empty")]
    walltime: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    node_args: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    mpirun: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    account: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    email: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    queue_name: String,
    is_serial: bool,
    depend_type: DependType,
    setup_depend: bool,
    overwrite: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    flags: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    additional_commands: String,
}

impl Default for QueueOptions {
    fn default() -> Self {
        Self {
            job_name: String::new(),
            nodes: 0,
            ng: 0,
            ppn: 0,
            threads: 0,
            run_type: RunType::Md,
            amberhome: None,
            program: String::new(),
            queue_type: QueueType::Pbs,
            walltime: String::new(),
            node_args: String::new(),
            mpirun: String::new(),
            account: String::new(),
            email: String::new(),
            queue_name: String::new(),
            is_serial: false,
            depend_type: DependType::Batch,
            setup_depend: true,
            overwrite: false,
            flags: Vec::new(),
            additional_commands: String::new(),
        }
    }
}

fn parse_int(option: &'static str, value: &str) -> Result<i32, OptionError> {
    value
        .trim()
        .parse()
        .map_err(|_| OptionError::InvalidInteger {
            option,
            value: value.to_string(),
        })
}

fn parse_switch(option: &'static str, value: &str) -> Result<bool, OptionError> {
    Ok(parse_int(option, value)? != 0)
}

impl QueueOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interprets one `NAME VALUE` pair from an option file.
    ///
    /// `QSUB` and `RUNTYPE` are matched case-sensitively against their closed
    /// sets of values. `MODULEFILE` reads the named file immediately and
    /// appends its contents to the additional-commands block. `AMBERHOME` must
    /// exist and is stored tilde-expanded.
    pub fn process_option(&mut self, name: &str, value: &str) -> Result<(), OptionError> {
        debug!("Processing option '{}' = '{}'", name, value);
        match name {
            "JOBNAME" => self.job_name = value.to_string(),
            "NODES" => self.nodes = parse_int("NODES", value)?,
            "NG" => self.ng = parse_int("NG", value)?,
            "PPN" => self.ppn = parse_int("PPN", value)?,
            "THREADS" => self.threads = parse_int("THREADS", value)?,
            "RUNTYPE" => self.run_type = value.parse()?,
            "AMBERHOME" => {
                self.amberhome = Some(paths::check_exists("AMBERHOME", Path::new(value))?);
            }
            "PROGRAM" => self.program = value.to_string(),
            "QSUB" => self.queue_type = value.parse()?,
            "WALLTIME" => self.walltime = value.to_string(),
            "NODEARGS" => self.node_args = value.to_string(),
            "MPIRUN" => self.mpirun = value.to_string(),
            "MODULEFILE" => {
                let path = paths::check_exists("Module file", Path::new(value))?;
                self.additional_commands.push_str(&text::read_all(&path)?);
            }
            "ACCOUNT" => self.account = value.to_string(),
            "EMAIL" => self.email = value.to_string(),
            "QUEUE" => self.queue_name = value.to_string(),
            "SERIAL" => self.is_serial = parse_switch("SERIAL", value)?,
            "CHAIN" => {
                if parse_int("CHAIN", value)? == 1 {
                    self.depend_type = DependType::Submit;
                }
            }
            "NO_DEPEND" => self.setup_depend = !parse_switch("NO_DEPEND", value)?,
            "FLAG" => self.flags.push(value.to_string()),
            _ => return Err(OptionError::UnrecognizedOption(name.to_string())),
        }
        Ok(())
    }

    /// Returns the first violated requirement, if any.
    pub fn check(&self) -> Result<(), ValidationError> {
        if self.job_name.is_empty() {
            return Err(ValidationError::NoJobName);
        }
        if self.program.is_empty() {
            return Err(ValidationError::NoProgram);
        }
        if !self.is_serial && self.mpirun.is_empty() {
            return Err(ValidationError::NoMpiRun);
        }
        Ok(())
    }

    /// Derives the thread count from nodes and processes-per-node unless it
    /// was set explicitly.
    pub fn calc_threads(&mut self) {
        if self.threads < 1 {
            self.threads = self.nodes * self.ppn;
        }
        if self.threads < 1 {
            warn!("Less than 1 thread specified.");
        }
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string(self)
    }

    pub fn set_run_type(&mut self, run_type: RunType) {
        self.run_type = run_type;
    }

    pub fn set_overwrite(&mut self, overwrite: bool) {
        self.overwrite = overwrite;
    }

    pub fn job_name(&self) -> &str {
        &self.job_name
    }
    pub fn nodes(&self) -> i32 {
        self.nodes
    }
    pub fn ng(&self) -> i32 {
        self.ng
    }
    pub fn ppn(&self) -> i32 {
        self.ppn
    }
    pub fn threads(&self) -> i32 {
        self.threads
    }
    pub fn run_type(&self) -> RunType {
        self.run_type
    }
    pub fn amberhome(&self) -> Option<&Path> {
        self.amberhome.as_deref()
    }
    pub fn program(&self) -> &str {
        &self.program
    }
    pub fn queue_type(&self) -> QueueType {
        self.queue_type
    }
    pub fn walltime(&self) -> &str {
        &self.walltime
    }
    pub fn node_args(&self) -> &str {
        &self.node_args
    }
    pub fn mpirun(&self) -> &str {
        &self.mpirun
    }
    pub fn account(&self) -> &str {
        &self.account
    }
    pub fn email(&self) -> &str {
        &self.email
    }
    pub fn queue_name(&self) -> &str {
        &self.queue_name
    }
    pub fn is_serial(&self) -> bool {
        self.is_serial
    }
    pub fn depend_type(&self) -> DependType {
        self.depend_type
    }
    pub fn setup_depend(&self) -> bool {
        self.setup_depend
    }
    pub fn overwrite(&self) -> bool {
        self.overwrite
    }
    pub fn flags(&self) -> &[String] {
        &self.flags
    }
    pub fn additional_commands(&self) -> &str {
        &self.additional_commands
    }
}

/// The human-readable job summary. Optional settings that were never given
/// produce no line.
impl fmt::Display for QueueOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "---=== Job Submission ===---")?;
        writeln!(f, "  RUNTYPE   : {}", self.run_type)?;
        writeln!(f, "  JOBNAME   : {}", self.job_name)?;
        if self.nodes > 0 {
            writeln!(f, "  NODES     : {}", self.nodes)?;
        }
        if self.ng > 0 {
            writeln!(f, "  NG        : {}", self.ng)?;
        }
        if self.ppn > 0 {
            writeln!(f, "  PPN       : {}", self.ppn)?;
        }
        if self.threads > 0 {
            writeln!(f, "  THREADS   : {}", self.threads)?;
        }
        if let Some(amberhome) = &self.amberhome {
            writeln!(f, "  AMBERHOME : {}", amberhome.display())?;
        }
        writeln!(f, "  PROGRAM   : {}", self.program)?;
        writeln!(f, "  QSUB      : {}", self.queue_type)?;
        let optional = [
            ("WALLTIME", &self.walltime),
            ("MPIRUN", &self.mpirun),
            ("NODEARGS", &self.node_args),
            ("ACCOUNT", &self.account),
            ("EMAIL", &self.email),
            ("QUEUE", &self.queue_name),
        ];
        for (label, value) in optional {
            if !value.is_empty() {
                writeln!(f, "  {:<10}: {}", label, value)?;
            }
        }
        writeln!(f, "  CHAIN     : {}", self.depend_type.code())?;
        writeln!(f, "  NO_DEPEND : {}", u8::from(!self.setup_depend))
    }
}
