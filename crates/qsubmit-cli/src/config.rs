use crate::cli::ConfigArgs;
use crate::error::{CliError, Result};
use qsubmit::workflows::submit::{SubmitConfig, SubmitConfigBuilder};
use std::path::PathBuf;

/// Splits each `-S KEY=VALUE` argument into an option name and its value.
///
/// The value may itself contain `=`; only the first one separates.
pub fn parse_set_values(set_values: &[String]) -> Result<Vec<(String, String)>> {
    set_values
        .iter()
        .map(|kv_pair| {
            let Some((key, value)) = kv_pair.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                )));
            };
            let key = key.trim();
            if key.is_empty() {
                return Err(CliError::Argument(format!(
                    "Empty option name in --set '{}'",
                    kv_pair
                )));
            }
            Ok((key.to_string(), value.to_string()))
        })
        .collect()
}

/// Merges the configuration file path with the command-line overrides.
pub fn build_config(
    args: &ConfigArgs,
    top: Option<PathBuf>,
    start: Option<usize>,
    overwrite: bool,
) -> Result<SubmitConfig> {
    let mut builder = SubmitConfigBuilder::new()
        .config_path(args.config.clone())
        .start_index(start)
        .overwrite(overwrite);
    if let Some(top) = top {
        builder = builder.top_dir(top);
    }
    for (key, value) in parse_set_values(&args.set_values)? {
        builder = builder.override_option(key, value);
    }
    Ok(builder.build()?)
}
