use super::options::{DependType, QueueOptions, QueueType};
use crate::core::io::paths::FsError;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("No script name given")]
    EmptyScriptName,
    #[error(transparent)]
    Fs(#[from] FsError),
}

/// `NODEARGS` is written for PBS as a suffix of the `nodes=` resource, so it
/// usually starts with `:`. For SBATCH the value must be a directive
/// argument such as `--gres=gpu:2`; a leading `:` is dropped.
fn sbatch_node_args(node_args: &str) -> &str {
    node_args.trim().trim_start_matches(':').trim_start()
}

impl QueueOptions {
    /// `<job_name>.<run_index>`, or just the job name when there is no index.
    pub fn job_title(&self, run_index: Option<usize>) -> String {
        match run_index {
            Some(idx) => format!("{}.{}", self.job_name(), idx),
            None => self.job_name().to_string(),
        }
    }

    /// Writes a new submission script at `script` containing the scheduler
    /// header for this profile.
    ///
    /// A dependency on `previous_job` is written only when dependencies are
    /// chained through batch directives; with external chaining the id is
    /// ignored. An empty script path fails before anything is created.
    pub fn qsub_header(
        &self,
        script: &Path,
        run_index: Option<usize>,
        previous_job: Option<&str>,
    ) -> Result<(), ScriptError> {
        if script.as_os_str().is_empty() {
            error!("qsub_header: no script name.");
            return Err(ScriptError::EmptyScriptName);
        }
        info!("Writing {}", script.display());
        let file = File::create(script).map_err(|e| {
            error!("Could not create '{}': {}", script.display(), e);
            FsError::io(script, e)
        })?;
        let mut writer = BufWriter::new(file);
        self.write_header(&mut writer, run_index, previous_job)
            .and_then(|_| writer.flush())
            .map_err(|e| FsError::io(script, e))?;
        Ok(())
    }

    pub fn write_header<W: Write>(
        &self,
        writer: &mut W,
        run_index: Option<usize>,
        previous_job: Option<&str>,
    ) -> io::Result<()> {
        let title = self.job_title(run_index);
        let previous_job = match self.depend_type() {
            DependType::Submit => None,
            DependType::Batch => previous_job.filter(|id| !id.is_empty()),
        };
        match self.queue_type() {
            QueueType::Pbs => self.write_pbs_header(writer, &title, previous_job),
            QueueType::Sbatch => self.write_sbatch_header(writer, &title, previous_job),
        }
    }

    fn write_pbs_header<W: Write>(
        &self,
        writer: &mut W,
        title: &str,
        previous_job: Option<&str>,
    ) -> io::Result<()> {
        let mut resources = format!("nodes={}", self.nodes());
        if self.ppn() > 0 {
            resources.push_str(&format!(":ppn={}", self.ppn()));
        }
        resources.push_str(self.node_args());

        writeln!(writer, "#PBS -S /bin/bash")?;
        writeln!(writer, "#PBS -l walltime={},{}", self.walltime(), resources)?;
        writeln!(writer, "#PBS -N {}", title)?;
        writeln!(writer, "#PBS -j oe")?;
        if !self.email().is_empty() {
            writeln!(writer, "#PBS -m abe")?;
            writeln!(writer, "#PBS -M {}", self.email())?;
        }
        if !self.account().is_empty() {
            writeln!(writer, "#PBS -A {}", self.account())?;
        }
        if let Some(job_id) = previous_job {
            writeln!(writer, "#PBS -W depend=afterok:{}", job_id)?;
        }
        if !self.queue_name().is_empty() {
            writeln!(writer, "#PBS -q {}", self.queue_name())?;
        }
        self.write_flags(writer)?;
        writeln!(writer, "\ncd $PBS_O_WORKDIR")
    }

    fn write_sbatch_header<W: Write>(
        &self,
        writer: &mut W,
        title: &str,
        previous_job: Option<&str>,
    ) -> io::Result<()> {
        writeln!(writer, "#!/bin/bash")?;
        if !self.walltime().is_empty() {
            writeln!(writer, "#SBATCH --time={}", self.walltime())?;
        }
        writeln!(writer, "#SBATCH --nodes={}", self.nodes())?;
        if self.ppn() > 0 {
            writeln!(writer, "#SBATCH --ntasks-per-node={}", self.ppn())?;
        }
        let node_args = sbatch_node_args(self.node_args());
        if !node_args.is_empty() {
            writeln!(writer, "#SBATCH {}", node_args)?;
        }
        writeln!(writer, "#SBATCH -J {}", title)?;
        writeln!(writer, "#SBATCH -o {}.%j.out", title)?;
        if !self.email().is_empty() {
            writeln!(writer, "#SBATCH --mail-type=ALL")?;
            writeln!(writer, "#SBATCH --mail-user={}", self.email())?;
        }
        if !self.account().is_empty() {
            writeln!(writer, "#SBATCH -A {}", self.account())?;
        }
        if let Some(job_id) = previous_job {
            writeln!(writer, "#SBATCH --dependency=afterok:{}", job_id)?;
        }
        if !self.queue_name().is_empty() {
            writeln!(writer, "#SBATCH -p {}", self.queue_name())?;
        }
        self.write_flags(writer)?;
        writeln!(writer, "\ncd $SLURM_SUBMIT_DIR")
    }

    fn write_flags<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for flag in self.flags() {
            writeln!(writer, "#{} {}", self.queue_type().as_str(), flag)?;
        }
        Ok(())
    }

    /// The command that launches the simulation program with `cmd_opts`.
    pub fn run_command(&self, cmd_opts: &str) -> String {
        let executable = match self.amberhome() {
            Some(_) => format!("$AMBERHOME/bin/{}", self.program()),
            None => self.program().to_string(),
        };
        let launcher = if self.is_serial() { "" } else { self.mpirun() };
        [launcher, executable.as_str(), cmd_opts]
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn write_run_commands<W: Write>(&self, writer: &mut W, cmd_opts: &str) -> io::Result<()> {
        writeln!(writer)?;
        let extra = self.additional_commands();
        if !extra.is_empty() {
            write!(writer, "{}", extra)?;
            if !extra.ends_with('\n') {
                writeln!(writer)?;
            }
        }
        if let Some(amberhome) = self.amberhome() {
            writeln!(writer, "export AMBERHOME={}", amberhome.display())?;
        }
        if cmd_opts.contains("$NG") {
            writeln!(writer, "NG={}", self.ng())?;
        }
        writeln!(writer, "{}", self.run_command(cmd_opts))
    }

    /// Appends the module block and the program launch line to an existing
    /// script written by [`QueueOptions::qsub_header`].
    pub fn append_run_commands(&self, script: &Path, cmd_opts: &str) -> Result<(), ScriptError> {
        let file = OpenOptions::new()
            .append(true)
            .open(script)
            .map_err(|e| FsError::io(script, e))?;
        let mut writer = BufWriter::new(file);
        self.write_run_commands(&mut writer, cmd_opts)
            .and_then(|_| writer.flush())
            .map_err(|e| FsError::io(script, e))?;
        Ok(())
    }
}
