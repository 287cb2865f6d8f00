//! AudioQR CLI entry point

use std::process::ExitCode;

use clap::Parser;

use audio_qr::cli::{
    app::{load_merged_config, run_encode, run_probe, run_record, RunOptions},
    args::{Cli, Commands},
    config_cmd::handle_config_command,
    presenter::Presenter,
    EXIT_ERROR, EXIT_USAGE_ERROR,
};
use audio_qr::domain::config::AppConfig;
use audio_qr::infrastructure::XdgConfigStore;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let presenter = Presenter::new();

    let default_filter = if cli.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();

    let command = match cli.command {
        Some(Commands::Config { action }) => {
            let store = XdgConfigStore::new();
            if let Err(e) = handle_config_command(action, &store, &presenter).await {
                presenter.error(&e.to_string());
                return ExitCode::from(EXIT_ERROR);
            }
            return ExitCode::SUCCESS;
        }
        other => other,
    };

    // Build CLI config from args
    let cli_config = AppConfig {
        duration: cli.duration.clone(),
        prefer_quality: if cli.prefer_native { Some(false) } else { None },
        output: cli
            .output
            .as_ref()
            .map(|p| p.to_string_lossy().into_owned()),
        ..Default::default()
    };

    let config = load_merged_config(cli_config).await;
    let options = match RunOptions::from_config(&config, cli.data_uri) {
        Ok(options) => options,
        Err(e) => {
            presenter.error(&e);
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
    };

    match command {
        Some(Commands::Probe { json }) => run_probe(json, &options),
        Some(Commands::Encode { file }) => run_encode(&file, options).await,
        Some(Commands::Config { .. }) | None => run_record(options).await,
    }
}
