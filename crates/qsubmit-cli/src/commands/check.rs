use crate::cli::CheckArgs;
use crate::config::build_config;
use crate::error::Result;
use qsubmit::workflows::submit::{self, SummaryFormat};

pub fn run(args: CheckArgs) -> Result<()> {
    let config = build_config(&args.config, None, None, false)?;
    let format = if args.toml {
        SummaryFormat::Toml
    } else {
        SummaryFormat::Text
    };
    print!("{}", submit::describe(&config, format)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::ConfigArgs;
    use crate::error::CliError;
    use qsubmit::engine::error::LoadError;
    use std::fs;
    use tempfile::TempDir;

    fn args(config: std::path::PathBuf, set_values: Vec<String>) -> CheckArgs {
        CheckArgs {
            config: ConfigArgs { config, set_values },
            toml: true,
        }
    }

    #[test]
    fn check_accepts_valid_configuration() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("queue.in");
        fs::write(&path, "JOBNAME ala\nPROGRAM sander\nSERIAL 1\n").unwrap();
        assert!(run(args(path, Vec::new())).is_ok());
    }

    #[test]
    fn check_reports_validation_failure_after_overrides() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("queue.in");
        fs::write(&path, "JOBNAME ala\nPROGRAM sander\nSERIAL 1\n").unwrap();
        let result = run(args(path, vec!["SERIAL=0".to_string()]));
        assert!(matches!(
            result,
            Err(CliError::Submit(qsubmit::engine::error::SubmitError::Load(
                LoadError::Validation { .. }
            )))
        ));
    }
}
