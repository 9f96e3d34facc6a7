//! Config command implementation.

use colored::Colorize;

use super::Context;
use crate::cli::ConfigCommands;
use crate::config::{QsyncConfig, config_path, normalize_endpoint, save_config};
use crate::error::{Error, Result};

/// Execute config commands. No subcommand means `show`.
pub fn execute(ctx: &Context, command: Option<&ConfigCommands>) -> Result<()> {
    match command {
        None | Some(ConfigCommands::Show) => show(ctx),
        Some(ConfigCommands::Set {
            endpoint,
            interval,
            timeout,
            conflict_policy,
        }) => {
            let update = QsyncConfig {
                endpoint: endpoint.as_deref().map(normalize_endpoint).transpose()?,
                interval_secs: *interval,
                timeout_secs: *timeout,
                conflict_policy: *conflict_policy,
            };
            set(ctx, &update)
        }
    }
}

fn show(ctx: &Context) -> Result<()> {
    let settings = &ctx.settings;
    if ctx.json {
        let output = serde_json::json!({
            "config_path": config_path()?.display().to_string(),
            "settings": settings,
        });
        println!("{output}");
        return Ok(());
    }

    println!("Config file:     {}", config_path()?.display());
    println!("Store:           {}", settings.store_path.display());
    println!("Endpoint:        {}", settings.endpoint);
    println!("Interval:        {}s", settings.interval.as_secs());
    println!("Timeout:         {}s", settings.timeout.as_secs());
    println!("Conflict policy: {}", settings.conflict_policy);
    Ok(())
}

fn set(ctx: &Context, update: &QsyncConfig) -> Result<()> {
    if *update == QsyncConfig::default() {
        return Err(Error::InvalidArgument(
            "nothing to set; pass --endpoint, --interval, --timeout or --conflict-policy".into(),
        ));
    }
    if update.interval_secs == Some(0) || update.timeout_secs == Some(0) {
        return Err(Error::InvalidArgument(
            "interval and timeout must be at least one second".into(),
        ));
    }

    let saved = save_config(update)?;
    if ctx.json {
        println!("{}", serde_json::to_string(&saved)?);
    } else {
        println!("{} {}", "Saved".green(), config_path()?.display());
    }
    Ok(())
}
