use crate::cli::AnalyzeArgs;
use crate::config::build_config;
use crate::error::Result;
use qsubmit::engine::submission::NoSubmit;
use qsubmit::workflows;
use tracing::info;

pub fn run(args: AnalyzeArgs) -> Result<()> {
    let config = build_config(&args.config, Some(args.top.clone()), None, false)?;
    let (script, job_id) = workflows::submit::analyze(&config, &NoSubmit)?;
    if let Some(job_id) = job_id {
        info!("Analysis submitted as job {}", job_id);
    }
    println!("{}", script.display());
    Ok(())
}
