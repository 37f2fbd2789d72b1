use super::context::LoadContext;
use super::error::LoadError;
use crate::core::io::paths;
use crate::core::io::text::TextReader;
use crate::core::queue::options::QueueOptions;
use std::path::Path;
use tracing::{error, info};

/// Splits `<NAME> <ARGS>` at the first whitespace run.
fn split_option(line: &str) -> Option<(&str, &str)> {
    let idx = line.find(char::is_whitespace)?;
    Some((&line[..idx], line[idx..].trim_start()))
}

/// Reads `NAME ARGS` option files into [`QueueOptions`].
///
/// Besides plain options, three directives are understood:
/// - `INPUT_FILE <path>` reads another file into the same profile;
/// - `ANALYZE_FILE <path>` / `ARCHIVE_FILE <path>` read a file into a new
///   analysis or archive profile. Each may appear once per loader, counting
///   occurrences inside the profile file itself.
///
/// Every file opened counts against [`MAX_INPUT_FILES`](super::context::MAX_INPUT_FILES),
/// and a file may not include any file that is currently being read.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    context: LoadContext,
    analyze: Option<QueueOptions>,
    archive: Option<QueueOptions>,
    analyze_seen: bool,
    archive_seen: bool,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn context(&self) -> &LoadContext {
        &self.context
    }

    pub fn analyze(&self) -> Option<&QueueOptions> {
        self.analyze.as_ref()
    }

    pub fn archive(&self) -> Option<&QueueOptions> {
        self.archive.as_ref()
    }

    /// Consumes the loader, returning the analysis and archive profiles.
    pub fn into_profiles(self) -> (Option<QueueOptions>, Option<QueueOptions>) {
        (self.analyze, self.archive)
    }

    pub fn read_options(&mut self, path: &Path, target: &mut QueueOptions) -> Result<(), LoadError> {
        info!("  Reading queue options from '{}'", path.display());
        let resolved = paths::check_exists("Queue options", path)?;
        self.context.enter(&resolved)?;
        let result = self.read_file(&resolved, target);
        self.context.leave();
        result
    }

    fn read_file(&mut self, path: &Path, target: &mut QueueOptions) -> Result<(), LoadError> {
        let mut reader = TextReader::open(path)?;
        while let Some(line) = reader.next_line()? {
            if line.trim().is_empty() {
                continue;
            }
            let line_number = reader.line_number();
            let Some((name, args)) = split_option(&line) else {
                error!("Malformed option: {}", line);
                return Err(LoadError::Malformed {
                    path: path.to_path_buf(),
                    line: line_number,
                    content: line.clone(),
                });
            };

            match name {
                "ANALYZE_FILE" => {
                    if std::mem::replace(&mut self.analyze_seen, true) {
                        error!("Only one ANALYZE_FILE allowed.");
                        return Err(LoadError::Duplicate {
                            directive: "ANALYZE_FILE",
                        });
                    }
                    let mut profile = QueueOptions::new();
                    self.read_options(Path::new(args), &mut profile)?;
                    self.analyze = Some(profile);
                }
                "ARCHIVE_FILE" => {
                    if std::mem::replace(&mut self.archive_seen, true) {
                        error!("Only one ARCHIVE_FILE allowed.");
                        return Err(LoadError::Duplicate {
                            directive: "ARCHIVE_FILE",
                        });
                    }
                    let mut profile = QueueOptions::new();
                    self.read_options(Path::new(args), &mut profile)?;
                    self.archive = Some(profile);
                }
                "INPUT_FILE" => {
                    let include = Path::new(args);
                    if let Some(resolved) = paths::tilde_expansion(include) {
                        if self.context.is_ancestor(&resolved) {
                            error!("An input file may not read from itself ({}).", args);
                            return Err(LoadError::SelfReference { path: resolved });
                        }
                    }
                    self.read_options(include, target)?;
                }
                _ => {
                    target.process_option(name, args).map_err(|source| {
                        error!("{}", source);
                        LoadError::InvalidOption {
                            path: path.to_path_buf(),
                            line: line_number,
                            source,
                        }
                    })?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::queue::options::{OptionError, QueueType, RunType};
    use crate::engine::context::MAX_INPUT_FILES;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn split_option_uses_first_whitespace_run() {
        assert_eq!(split_option("JOBNAME  my job"), Some(("JOBNAME", "my job")));
        assert_eq!(split_option("FLAG\t-l gres=ccm"), Some(("FLAG", "-l gres=ccm")));
        assert_eq!(split_option("JOBNAME"), None);
    }

    #[test]
    fn reads_options_from_single_file() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "queue.in",
            "JOBNAME ala\r\nNODES 2\nPPN 16\n\nQSUB SBATCH\nRUNTYPE TREMD\nPROGRAM pmemd.MPI\nMPIRUN srun\n",
        );
        let mut opts = QueueOptions::new();
        let mut loader = ConfigLoader::new();
        loader.read_options(&path, &mut opts).unwrap();

        assert_eq!(opts.job_name(), "ala");
        assert_eq!(opts.nodes(), 2);
        assert_eq!(opts.ppn(), 16);
        assert_eq!(opts.queue_type(), QueueType::Sbatch);
        assert_eq!(opts.run_type(), RunType::TemperatureReplica);
        assert_eq!(opts.mpirun(), "srun");
        assert_eq!(loader.context().files_read(), 1);
        assert!(loader.analyze().is_none());
        assert!(loader.archive().is_none());
    }

    #[test]
    fn line_without_separator_is_malformed_for_any_option() {
        let dir = TempDir::new().unwrap();
        for name in ["JOBNAME", "NODES", "INPUT_FILE", "ANALYZE_FILE", "BOGUS"] {
            let path = write(&dir, "bad.in", &format!("{}\nJOBNAME x\n", name));
            let mut opts = QueueOptions::new();
            let result = ConfigLoader::new().read_options(&path, &mut opts);
            match result {
                Err(LoadError::Malformed { line, content, .. }) => {
                    assert_eq!(line, 1);
                    assert_eq!(content, name);
                }
                other => panic!("Expected malformed error for '{}', got {:?}", name, other),
            }
        }
    }

    #[test]
    fn option_failure_aborts_with_location() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "queue.in", "JOBNAME a\nQSUB LSF\nNODES 2\n");
        let mut opts = QueueOptions::new();
        let err = ConfigLoader::new().read_options(&path, &mut opts).unwrap_err();
        match err {
            LoadError::InvalidOption { line, source, .. } => {
                assert_eq!(line, 2);
                assert!(matches!(source, OptionError::UnrecognizedValue { option: "QSUB", .. }));
            }
            other => panic!("Unexpected error: {:?}", other),
        }
        assert_eq!(opts.nodes(), 0);
    }

    #[test]
    fn input_file_reads_into_same_profile() {
        let dir = TempDir::new().unwrap();
        let common = write(&dir, "common.in", "NODES 4\nPPN 8\nMPIRUN mpirun\n");
        let main = write(
            &dir,
            "main.in",
            &format!("JOBNAME x\nINPUT_FILE {}\nPROGRAM sander.MPI\n", common.display()),
        );
        let mut opts = QueueOptions::new();
        let mut loader = ConfigLoader::new();
        loader.read_options(&main, &mut opts).unwrap();

        assert_eq!(opts.nodes(), 4);
        assert_eq!(opts.ppn(), 8);
        assert_eq!(opts.program(), "sander.MPI");
        assert_eq!(loader.context().files_read(), 2);
        assert_eq!(loader.context().depth(), 0);
    }

    #[test]
    fn file_including_itself_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("self.in");
        fs::write(&path, format!("JOBNAME x\nINPUT_FILE {}\n", path.display())).unwrap();

        let mut opts = QueueOptions::new();
        let err = ConfigLoader::new().read_options(&path, &mut opts).unwrap_err();
        assert!(matches!(err, LoadError::SelfReference { .. }));
    }

    #[test]
    fn longer_include_cycle_is_rejected_as_self_reference() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.in");
        let b = dir.path().join("b.in");
        fs::write(&a, format!("INPUT_FILE {}\n", b.display())).unwrap();
        fs::write(&b, format!("INPUT_FILE {}\n", a.display())).unwrap();

        let mut opts = QueueOptions::new();
        let err = ConfigLoader::new().read_options(&a, &mut opts).unwrap_err();
        assert!(matches!(err, LoadError::SelfReference { .. }));
    }

    fn write_chain(dir: &TempDir, length: usize) -> PathBuf {
        for i in 0..length {
            let body = if i + 1 < length {
                format!("INPUT_FILE {}\n", dir.path().join(format!("chain{}.in", i + 1)).display())
            } else {
                "JOBNAME deep\n".to_string()
            };
            write(dir, &format!("chain{}.in", i), &body);
        }
        dir.path().join("chain0.in")
    }

    #[test]
    fn include_chain_at_the_limit_is_accepted() {
        let dir = TempDir::new().unwrap();
        let first = write_chain(&dir, MAX_INPUT_FILES);
        let mut opts = QueueOptions::new();
        let mut loader = ConfigLoader::new();
        loader.read_options(&first, &mut opts).unwrap();
        assert_eq!(opts.job_name(), "deep");
        assert_eq!(loader.context().files_read(), MAX_INPUT_FILES);
    }

    #[test]
    fn include_chain_past_the_limit_is_rejected() {
        let dir = TempDir::new().unwrap();
        let first = write_chain(&dir, MAX_INPUT_FILES + 1);
        let mut opts = QueueOptions::new();
        let err = ConfigLoader::new().read_options(&first, &mut opts).unwrap_err();
        assert!(matches!(err, LoadError::RecursionLimit { .. }));
    }

    #[test]
    fn analyze_and_archive_files_create_separate_profiles() {
        let dir = TempDir::new().unwrap();
        let analyze = write(&dir, "analyze.in", "JOBNAME ana\nPROGRAM cpptraj\nSERIAL 1\n");
        let archive = write(&dir, "archive.in", "JOBNAME arc\nPROGRAM tar\nSERIAL 1\n");
        let main = write(
            &dir,
            "main.in",
            &format!(
                "JOBNAME md\nANALYZE_FILE {}\nARCHIVE_FILE {}\n",
                analyze.display(),
                archive.display()
            ),
        );

        let mut opts = QueueOptions::new();
        let mut loader = ConfigLoader::new();
        loader.read_options(&main, &mut opts).unwrap();
        assert_eq!(opts.job_name(), "md");
        assert_eq!(loader.context().files_read(), 3);

        let (analyze, archive) = loader.into_profiles();
        assert_eq!(analyze.unwrap().program(), "cpptraj");
        assert_eq!(archive.unwrap().job_name(), "arc");
    }

    #[test]
    fn second_analyze_file_at_any_depth_is_rejected() {
        let dir = TempDir::new().unwrap();
        let analyze = write(&dir, "analyze.in", "JOBNAME ana\n");
        let nested = write(&dir, "nested.in", &format!("ANALYZE_FILE {}\n", analyze.display()));
        let main = write(
            &dir,
            "main.in",
            &format!(
                "ANALYZE_FILE {}\nINPUT_FILE {}\n",
                analyze.display(),
                nested.display()
            ),
        );

        let mut opts = QueueOptions::new();
        let err = ConfigLoader::new().read_options(&main, &mut opts).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Duplicate {
                directive: "ANALYZE_FILE"
            }
        ));
    }

    #[test]
    fn missing_file_is_reported_as_not_found() {
        let dir = TempDir::new().unwrap();
        let mut opts = QueueOptions::new();
        let err = ConfigLoader::new()
            .read_options(&dir.path().join("none.in"), &mut opts)
            .unwrap_err();
        assert!(matches!(err, LoadError::Fs(_)));
    }

    #[test]
    fn profile_file_repeating_its_own_directive_is_rejected() {
        for directive in ["ANALYZE_FILE", "ARCHIVE_FILE"] {
            let dir = TempDir::new().unwrap();
            let inner = write(&dir, "inner.in", "JOBNAME inner\n");
            let outer = write(
                &dir,
                "outer.in",
                &format!("JOBNAME outer\n{} {}\n", directive, inner.display()),
            );
            let main = write(
                &dir,
                "main.in",
                &format!("JOBNAME md\n{} {}\n", directive, outer.display()),
            );

            let mut opts = QueueOptions::new();
            let mut loader = ConfigLoader::new();
            let err = loader.read_options(&main, &mut opts).unwrap_err();
            match err {
                LoadError::Duplicate { directive: found } => assert_eq!(found, directive),
                other => panic!("Expected duplicate {}, got {:?}", directive, other),
            }
            assert!(loader.analyze().is_none());
            assert!(loader.archive().is_none());
        }
    }
}
