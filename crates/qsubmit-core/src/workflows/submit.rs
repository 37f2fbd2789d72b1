use crate::core::replica::allocator::ReplicaAllocator;
use crate::core::replica::dimension::{DimensionError, ExchangeType};
use crate::engine::error::{LoadError, SubmitError};
use crate::engine::progress::ProgressReporter;
use crate::engine::submission::{JobSubmitter, RunReport, Submission};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, instrument};

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
}

/// Everything a submission workflow needs besides the run directories.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitConfig {
    pub config_path: PathBuf,
    pub top_dir: PathBuf,
    pub start_index: Option<usize>,
    pub overwrite: bool,
    /// `NAME VALUE` pairs applied after the option files are read.
    pub overrides: Vec<(String, String)>,
}

#[derive(Default)]
pub struct SubmitConfigBuilder {
    config_path: Option<PathBuf>,
    top_dir: Option<PathBuf>,
    start_index: Option<usize>,
    overwrite: bool,
    overrides: Vec<(String, String)>,
}

impl SubmitConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config_path(mut self, path: PathBuf) -> Self {
        self.config_path = Some(path);
        self
    }

    pub fn top_dir(mut self, path: PathBuf) -> Self {
        self.top_dir = Some(path);
        self
    }

    pub fn start_index(mut self, start: Option<usize>) -> Self {
        self.start_index = start;
        self
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn override_option(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.overrides.push((name.into(), value.into()));
        self
    }

    /// Builds the configuration. The top directory defaults to `.`.
    pub fn build(self) -> Result<SubmitConfig, ConfigError> {
        Ok(SubmitConfig {
            config_path: self
                .config_path
                .ok_or(ConfigError::MissingParameter("config_path"))?,
            top_dir: self.top_dir.unwrap_or_else(|| PathBuf::from(".")),
            start_index: self.start_index,
            overwrite: self.overwrite,
            overrides: self.overrides,
        })
    }
}

/// Loads and validates the submission described by `config`.
pub fn load(config: &SubmitConfig) -> Result<Submission, LoadError> {
    let mut submission = Submission::load_with_overrides(&config.config_path, &config.overrides)?;
    submission.set_overwrite(config.overwrite);
    Ok(submission)
}

/// Writes (and hands to `submitter`) one script per run directory.
#[instrument(skip_all, name = "submit_workflow")]
pub fn run(
    config: &SubmitConfig,
    run_dirs: &[PathBuf],
    submitter: &dyn JobSubmitter,
    reporter: &ProgressReporter,
) -> Result<RunReport, SubmitError> {
    let mut submission = load(config)?;
    let report = submission.submit_runs(
        &config.top_dir,
        run_dirs,
        config.start_index,
        submitter,
        reporter,
    )?;
    info!(
        "Wrote {} scripts, skipped {} run directories.",
        report.written.len(),
        report.skipped.len()
    );
    Ok(report)
}

/// Writes the analysis script into the top directory.
#[instrument(skip_all, name = "analysis_workflow")]
pub fn analyze(
    config: &SubmitConfig,
    submitter: &dyn JobSubmitter,
) -> Result<(PathBuf, Option<String>), SubmitError> {
    let mut submission = load(config)?;
    submission.submit_analysis(&config.top_dir, submitter)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SummaryFormat {
    #[default]
    Text,
    Toml,
}

/// Renders every loaded profile, primary first.
pub fn describe(config: &SubmitConfig, format: SummaryFormat) -> Result<String, SubmitError> {
    let submission = load(config)?;
    let mut run = submission.run().clone();
    run.calc_threads();
    let profiles = [
        ("primary", Some(&run)),
        ("analysis", submission.analyze()),
        ("archive", submission.archive()),
    ];

    let mut out = String::new();
    for (name, profile) in profiles {
        let Some(profile) = profile else { continue };
        match format {
            SummaryFormat::Text => {
                out.push_str(&format!("[{}]\n{}\n", name, profile));
            }
            SummaryFormat::Toml => {
                out.push_str(&format!("[{}]\n{}\n", name, profile.to_toml()?));
            }
        }
    }
    Ok(out)
}

/// What a loaded dimension file renders to, replica by replica.
#[derive(Debug, Clone, PartialEq)]
pub struct DimensionReport {
    pub key: &'static str,
    pub exchange_type: ExchangeType,
    pub description: String,
    pub replicas: Vec<ReplicaFragment>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReplicaFragment {
    pub index: usize,
    pub mdin: String,
    pub groupline: String,
    pub topology: Option<PathBuf>,
}

/// Loads one dimension file through the allocator and renders every replica.
#[instrument(skip_all, name = "dimension_workflow", fields(key = key))]
pub fn inspect_dimension(key: &str, path: &Path) -> Result<DimensionReport, DimensionError> {
    let dim = ReplicaAllocator::load(key, path)?;
    info!("{}: {} replicas", dim.description(), dim.size());

    let mut replicas = Vec::with_capacity(dim.size());
    for index in 0..dim.size() {
        let mut mdin = Vec::new();
        dim.write_mdin(index, &mut mdin)?;
        let ext = format!("{:03}", index);
        replicas.push(ReplicaFragment {
            index,
            mdin: String::from_utf8_lossy(&mdin).into_owned(),
            groupline: dim.groupline(&ext),
            topology: dim.topology(index).map(Path::to_path_buf),
        });
    }

    Ok(DimensionReport {
        key: dim.key(),
        exchange_type: dim.exchange_type(),
        description: dim.description().to_string(),
        replicas,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::submission::NoSubmit;
    use std::fs;
    use tempfile::TempDir;

    const CONFIG: &str = "JOBNAME ala\nNODES 2\nPPN 8\nPROGRAM pmemd.MPI\nMPIRUN mpirun\n";

    fn config_in(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("queue.in");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn builder_requires_config_path() {
        assert_eq!(
            SubmitConfigBuilder::new().build(),
            Err(ConfigError::MissingParameter("config_path"))
        );
        let config = SubmitConfigBuilder::new()
            .config_path(PathBuf::from("queue.in"))
            .build()
            .unwrap();
        assert_eq!(config.top_dir, PathBuf::from("."));
        assert!(!config.overwrite);
    }

    #[test]
    fn run_writes_scripts_under_top_dir() {
        let top = TempDir::new().unwrap();
        let config_path = config_in(&top, CONFIG);
        fs::create_dir(top.path().join("run.000")).unwrap();
        fs::write(top.path().join("run.000/groupfile"), "-O -i md.in\n").unwrap();

        let config = SubmitConfigBuilder::new()
            .config_path(config_path)
            .top_dir(top.path().to_path_buf())
            .start_index(Some(3))
            .override_option("QSUB", "SBATCH")
            .build()
            .unwrap();
        let report = run(
            &config,
            &[PathBuf::from("run.000")],
            &NoSubmit,
            &ProgressReporter::new(),
        )
        .unwrap();

        assert_eq!(report.written, vec![top.path().join("run.000/sbatch.sh")]);
        let script = fs::read_to_string(&report.written[0]).unwrap();
        assert!(script.starts_with("#!/bin/bash\n"));
        assert!(script.contains("#SBATCH -J ala.3\n"));
    }

    #[test]
    fn describe_renders_text_and_toml() {
        let top = TempDir::new().unwrap();
        let config = SubmitConfigBuilder::new()
            .config_path(config_in(&top, CONFIG))
            .build()
            .unwrap();

        let text = describe(&config, SummaryFormat::Text).unwrap();
        assert!(text.starts_with("[primary]\n"));
        assert!(text.contains("ala"));

        let toml = describe(&config, SummaryFormat::Toml).unwrap();
        assert!(toml.contains("job-name = \"ala\""));
        assert!(toml.contains("threads = 16"));
        assert!(!toml.contains("[analysis]"));
    }

    #[test]
    fn analyze_without_profile_fails() {
        let top = TempDir::new().unwrap();
        let config = SubmitConfigBuilder::new()
            .config_path(config_in(&top, CONFIG))
            .top_dir(top.path().to_path_buf())
            .build()
            .unwrap();
        assert!(matches!(
            analyze(&config, &NoSubmit),
            Err(SubmitError::NoAnalysisProfile)
        ));
    }

    #[test]
    fn inspect_dimension_renders_every_replica() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("temps.dim");
        fs::write(&path, "Temperatures\n300.0\n310.0\n").unwrap();

        let report = inspect_dimension("TEMPERATURE", &path).unwrap();
        assert_eq!(report.key, "TEMPERATURE");
        assert_eq!(report.exchange_type, ExchangeType::Temperature);
        assert_eq!(report.replicas.len(), 2);
        assert!(report.replicas[1].mdin.contains("temp0=310.000000"));
        assert!(report.replicas[0].groupline.is_empty());
        assert!(report.replicas[0].topology.is_none());

        assert!(matches!(
            inspect_dimension("PRESSURE", &path),
            Err(DimensionError::UnknownKey(_))
        ));
    }
}
