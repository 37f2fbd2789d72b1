use crate::cli::DimArgs;
use crate::error::Result;
use qsubmit::workflows::submit;

pub fn run(args: DimArgs) -> Result<()> {
    let report = submit::inspect_dimension(&args.kind, &args.file)?;
    println!("{} ({})", report.description, report.exchange_type);
    println!("Replicas: {}", report.replicas.len());
    for replica in &report.replicas {
        println!("--- replica {} ---", replica.index);
        if let Some(topology) = &replica.topology {
            println!("  topology: {}", topology.display());
        }
        if !replica.groupline.is_empty() {
            println!("  groupfile:{}", replica.groupline);
        }
        print!("{}", replica.mdin);
    }
    Ok(())
}
