use super::error::{LoadError, SubmitError};
use super::loader::ConfigLoader;
use super::progress::{Progress, ProgressReporter};
use crate::core::io::paths;
use crate::core::io::text::TextReader;
use crate::core::queue::options::{QueueOptions, RunType};
use std::path::{Path, PathBuf};
use tracing::{error, info};

pub const GROUPFILE_NAME: &str = "groupfile";
pub const REMD_DIM_NAME: &str = "remd.dim";

/// Hands a finished script to a batch scheduler.
///
/// Returning `Some(id)` makes the next script in the batch depend on job
/// `id`. The library never talks to a scheduler itself; front ends supply an
/// implementation if they want live submission.
pub trait JobSubmitter {
    fn submit(&self, script: &Path) -> Result<Option<String>, SubmitError>;
}

/// Writes scripts only.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSubmit;

impl JobSubmitter for NoSubmit {
    fn submit(&self, _script: &Path) -> Result<Option<String>, SubmitError> {
        Ok(None)
    }
}

/// Outcome of [`Submission::submit_runs`].
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunReport {
    pub written: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
    pub job_ids: Vec<String>,
}

/// A loaded submission: the primary profile plus the optional analysis and
/// archive profiles declared with `ANALYZE_FILE` / `ARCHIVE_FILE`.
#[derive(Debug, Clone)]
pub struct Submission {
    run: QueueOptions,
    analyze: Option<QueueOptions>,
    archive: Option<QueueOptions>,
    files_read: usize,
}

impl Submission {
    /// Loads and validates the configuration rooted at `path`.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        Self::load_with_overrides(path, &[])
    }

    /// Like [`Submission::load`], applying `overrides` to the primary profile
    /// after the files are read and before validation.
    pub fn load_with_overrides(path: &Path, overrides: &[(String, String)]) -> Result<Self, LoadError> {
        let mut loader = ConfigLoader::new();
        let mut run = QueueOptions::new();
        loader.read_options(path, &mut run)?;
        for (name, value) in overrides {
            run.process_option(name, value).map_err(|source| {
                error!("Override {}={}: {}", name, value, source);
                LoadError::InvalidOption {
                    path: PathBuf::from("<command line>"),
                    line: 0,
                    source,
                }
            })?;
        }

        let files_read = loader.context().files_read();
        let (analyze, archive) = loader.into_profiles();
        let submission = Self {
            run,
            analyze,
            archive,
            files_read,
        };
        submission.check()?;
        Ok(submission)
    }

    fn check(&self) -> Result<(), LoadError> {
        let profiles = [
            ("primary", Some(&self.run)),
            ("analysis", self.analyze.as_ref()),
            ("archive", self.archive.as_ref()),
        ];
        for (profile, opts) in profiles {
            if let Some(opts) = opts {
                opts.check().map_err(|source| {
                    error!("{} ({} profile)", source, profile);
                    LoadError::Validation { profile, source }
                })?;
            }
        }
        Ok(())
    }

    pub fn run(&self) -> &QueueOptions {
        &self.run
    }

    pub fn analyze(&self) -> Option<&QueueOptions> {
        self.analyze.as_ref()
    }

    pub fn archive(&self) -> Option<&QueueOptions> {
        self.archive.as_ref()
    }

    /// Number of option files read while loading.
    pub fn files_read(&self) -> usize {
        self.files_read
    }

    pub fn set_overwrite(&mut self, overwrite: bool) {
        self.run.set_overwrite(overwrite);
    }

    /// Writes one script per run directory, in order, under `top`.
    ///
    /// Run directory `i` gets run index `start + i` (`start` defaults to 0).
    /// A directory that already holds a script (without overwrite), or an MD
    /// directory without a groupfile, aborts the batch when dependencies are
    /// being set up and is skipped otherwise. Missing replica-exchange
    /// prerequisites always abort. Each job id returned by `submitter` becomes
    /// the dependency of the next script.
    pub fn submit_runs(
        &mut self,
        top: &Path,
        run_dirs: &[PathBuf],
        start: Option<usize>,
        submitter: &dyn JobSubmitter,
        reporter: &ProgressReporter,
    ) -> Result<RunReport, SubmitError> {
        info!("{}", self.run);
        self.run.calc_threads();
        info!("User: {}", paths::user_name());

        let opts = &self.run;
        let script_name = opts.queue_type().script_name();
        let first_index = start.unwrap_or(0);
        let mut report = RunReport::default();
        let mut previous_job: Option<String> = None;

        info!("Submitting {} runs.", run_dirs.len());
        reporter.report(Progress::PhaseStart {
            name: "Writing submission scripts",
        });
        reporter.report(Progress::TaskStart {
            total_steps: run_dirs.len() as u64,
        });

        for (position, rdir) in run_dirs.iter().enumerate() {
            let dir = top.join(rdir);
            let script = dir.join(&script_name);

            if !opts.overwrite() && paths::file_exists(&script) {
                error!(
                    "Not overwriting (-O) and {} already contains {}",
                    rdir.display(),
                    script_name
                );
                let err = SubmitError::ScriptExists {
                    dir: rdir.clone(),
                    script: script_name.clone(),
                };
                Self::skip_or_abort(opts, err, &dir, &mut report, reporter)?;
                continue;
            }
            info!("  {}", rdir.display());

            let cmd_opts = match Self::command_options(opts.run_type(), &dir, rdir)? {
                Some(cmd_opts) => cmd_opts,
                None => {
                    let err = SubmitError::MissingGroupfile { dir: rdir.clone() };
                    Self::skip_or_abort(opts, err, &dir, &mut report, reporter)?;
                    continue;
                }
            };
            info!("CmdOpts: {}", cmd_opts);
            reporter.report(Progress::Message(format!(
                "{}: {}",
                rdir.display(),
                cmd_opts
            )));

            opts.qsub_header(&script, Some(first_index + position), previous_job.as_deref())?;
            opts.append_run_commands(&script, &cmd_opts)?;
            let submitted = submitter
                .submit(&script)
                .inspect_err(|e| error!("{}", e))?;
            if let Some(job_id) = submitted {
                info!("Submitted {} as job {}", script.display(), job_id);
                report.job_ids.push(job_id.clone());
                previous_job = Some(job_id);
            }

            reporter.report(Progress::ScriptWritten {
                script: script.clone(),
            });
            reporter.report(Progress::TaskIncrement);
            report.written.push(script);
        }

        reporter.report(Progress::TaskFinish);
        reporter.report(Progress::PhaseFinish);
        Ok(report)
    }

    fn skip_or_abort(
        opts: &QueueOptions,
        err: SubmitError,
        dir: &Path,
        report: &mut RunReport,
        reporter: &ProgressReporter,
    ) -> Result<(), SubmitError> {
        if opts.setup_depend() {
            return Err(err);
        }
        reporter.report(Progress::RunSkipped {
            dir: dir.to_path_buf(),
            reason: err.to_string(),
        });
        reporter.report(Progress::TaskIncrement);
        report.skipped.push(dir.to_path_buf());
        Ok(())
    }

    /// Checks the run-type prerequisites in `dir` and returns the program's
    /// command-line options, or `None` for an MD run without a groupfile.
    fn command_options(
        run_type: RunType,
        dir: &Path,
        rdir: &Path,
    ) -> Result<Option<String>, SubmitError> {
        let groupfile = dir.join(GROUPFILE_NAME);
        let group_opts = format!("-ng $NG -groupfile {}", GROUPFILE_NAME);
        let cmd_opts = match run_type {
            RunType::TemperatureReplica => {
                paths::check_exists("groupfile", &groupfile)?;
                format!("{} -rem 1", group_opts)
            }
            RunType::HamiltonianReplica => {
                paths::check_exists("groupfile", &groupfile)?;
                format!("{} -rem 3", group_opts)
            }
            RunType::MultiReplica => {
                paths::check_exists("groupfile", &groupfile)?;
                paths::check_exists("remd.dim", &dir.join(REMD_DIM_NAME))?;
                format!("{} -remd-file {}", group_opts, REMD_DIM_NAME)
            }
            RunType::Md => {
                if !paths::file_exists(&groupfile) {
                    error!("groupfile does not exist for '{}'", rdir.display());
                    return Ok(None);
                }
                let mut reader = TextReader::open(&groupfile)?;
                let mut n_lines = 0;
                let mut last_line = String::new();
                while let Some(line) = reader.next_line()? {
                    n_lines += 1;
                    last_line = line;
                }
                if n_lines > 1 { group_opts } else { last_line }
            }
            RunType::Analysis | RunType::Archive => String::new(),
        };
        Ok(Some(cmd_opts))
    }

    /// Writes the analysis script into `top` and hands it to `submitter`.
    ///
    /// Requires an `ANALYZE_FILE` profile, whose run type is forced to
    /// `ANALYSIS`. The script is named `analysis.<submit-command>.sh` and is
    /// always rewritten.
    pub fn submit_analysis(
        &mut self,
        top: &Path,
        submitter: &dyn JobSubmitter,
    ) -> Result<(PathBuf, Option<String>), SubmitError> {
        let Some(analyze) = self.analyze.as_mut() else {
            error!("No ANALYZE_FILE set.");
            return Err(SubmitError::NoAnalysisProfile);
        };
        analyze.set_run_type(RunType::Analysis);
        info!("{}", analyze);
        info!("User: {}", paths::user_name());

        let script = top.join(format!("analysis.{}", analyze.queue_type().script_name()));
        analyze.qsub_header(&script, None, None)?;
        analyze.append_run_commands(&script, "")?;
        let job_id = submitter.submit(&script)?;
        Ok((script, job_id))
    }
}
