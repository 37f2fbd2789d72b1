use crate::cli::SubmitArgs;
use crate::config::build_config;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use qsubmit::engine::progress::ProgressReporter;
use qsubmit::engine::submission::NoSubmit;
use qsubmit::workflows;
use tracing::{info, warn};

pub fn run(args: SubmitArgs, quiet: bool) -> Result<()> {
    let config = build_config(
        &args.config,
        Some(args.top.clone()),
        args.start,
        args.overwrite,
    )?;

    let progress_handler = if quiet {
        CliProgressHandler::hidden()
    } else {
        CliProgressHandler::new()
    };
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    info!("Invoking the submission workflow...");
    let report = workflows::submit::run(&config, &args.run_dirs, &NoSubmit, &reporter)?;

    for script in &report.written {
        println!("{}", script.display());
    }
    let skipped = progress_handler.skipped();
    if skipped > 0 {
        warn!("{} run directories were skipped.", skipped);
        for dir in &report.skipped {
            println!("skipped: {}", dir.display());
        }
    }
    Ok(())
}
