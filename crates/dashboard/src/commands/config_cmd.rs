//! Config subcommand handlers.

use dashboard_config::{Config, KeySource};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

const REDACTED: &str = "********";

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            let path = super::config_file(global);
            output::print_output(&path.display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Show => {
            let (cfg, path) = super::load(global)?;
            let source = dashboard_config::resolve_api_key(&cfg.remote).map(|(_, source)| source);
            let shown = redacted(cfg);

            let rendered = match global.output {
                OutputFormat::Json => output::render_single(global.output, &shown, |_| String::new())?,
                OutputFormat::Table => {
                    let key = match source {
                        Some(KeySource::Env) => "from environment",
                        Some(KeySource::Keyring) => "from system keyring",
                        Some(KeySource::Plaintext) => "from config file",
                        None => "not set",
                    };
                    format!(
                        "# {}\n# api key: {key}\n\n{}",
                        path.display(),
                        toml::to_string_pretty(&shown)?
                    )
                }
            };
            output::print_output(&rendered, global.quiet);
            Ok(())
        }
    }
}

/// The config as loaded, with any plaintext API key masked.
fn redacted(mut cfg: Config) -> Config {
    if cfg.remote.api_key.is_some() {
        cfg.remote.api_key = Some(REDACTED.into());
    }
    cfg
}
