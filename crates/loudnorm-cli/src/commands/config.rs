//! Settings inspection.

use std::path::Path;

use clap::Args;
use loudnorm_config::{Settings, settings_path};

use super::common::load_settings;

#[derive(Args)]
pub struct ConfigArgs {
    /// Print the settings file path instead of its contents
    #[arg(long)]
    path: bool,

    /// Write the default settings to the settings file if it does not exist
    #[arg(long, conflicts_with = "path")]
    init: bool,
}

pub fn run(args: ConfigArgs, config: Option<&Path>) -> anyhow::Result<()> {
    let file = config.map_or_else(settings_path, Path::to_path_buf);

    if args.path {
        println!("{}", file.display());
        return Ok(());
    }

    if args.init {
        if file.exists() {
            println!("{} already exists", file.display());
        } else {
            Settings::default().save(&file)?;
            println!("Wrote {}", file.display());
        }
        return Ok(());
    }

    let settings = load_settings(config)?;
    print!("{}", settings.to_toml_string()?);
    Ok(())
}
