mod backend;
mod cli;
mod commands;
mod error_fmt;
mod logging;

use bias_config::Config;
use clap::Parser;
use cli::{Cli, Commands, ConfigAction, DEFAULT_CONFIG, JSON_MODE};
use error_fmt::INVALID_CONFIG;
use eyre::WrapErr;
use std::path::Path;

fn load_config(path: Option<&Path>) -> eyre::Result<Config> {
    let (path, required) = match path {
        Some(p) => (p, true),
        None => (Path::new(DEFAULT_CONFIG), false),
    };
    if !required && !path.exists() {
        return Ok(Config::default());
    }
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("read config {}", path.display()))?;
    let cfg = bias_config::load_toml(&text)
        .map_err(eyre::Report::new)
        .wrap_err_with(|| format!("parse config {}", path.display()))?;
    cfg.validate().wrap_err(INVALID_CONFIG)?;
    Ok(cfg)
}

fn dispatch(cli: &Cli, cfg: &Config) -> eyre::Result<()> {
    match &cli.cmd {
        Commands::Sweep { csv } => commands::sweep(cfg, csv.as_deref()),
        Commands::Detect { csv } => commands::detect_csv(cfg, csv),
        Commands::Lock { mode, cycles } => commands::lock(cfg, *mode, *cycles),
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_show(cfg),
            ConfigAction::Set { key, value, save } => commands::config_set(cfg, key, value, *save),
            ConfigAction::Save => commands::config_save(cfg),
        },
        Commands::SelfCheck => commands::self_check(cfg),
    }
}

fn try_main(cli: &Cli) -> eyre::Result<()> {
    let cfg = load_config(cli.config.as_deref())?;
    logging::init(&cli.log_level, cli.json, &cfg.logging)?;
    tracing::debug!(?cli.cmd, "starting");
    dispatch(cli, &cfg)
}

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);
    let _ = color_eyre::install();

    if let Err(e) = try_main(&cli) {
        tracing::error!(error = %e, "command failed");
        if cli.json {
            eprintln!("{}", error_fmt::format_error_json(&e));
        } else {
            eprintln!("{}", error_fmt::humanize(&e));
        }
        std::process::exit(error_fmt::exit_code_for_error(&e));
    }
}
