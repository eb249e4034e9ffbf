use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use env_logger::{Builder, Target};
use log::LevelFilter;
use roster_config::{ConfigLoad, ConfigLoader};
use roster_console::{
    Action, AppState, ConsoleApp, ConsoleError, ConsoleResult, ConsoleSettings,
    NavigationOutcome, TextPresenter,
    cli::{Cli, Command, UsersCommand},
    infra::{ApiClient, services::AdminApiAdapter},
};

const EXIT_UNAUTHORIZED: u8 = 2;

fn init_logger(verbose: bool) {
    let crate_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    Builder::new()
        .target(Target::Stderr)
        .filter_level(LevelFilter::Warn)
        .filter_module("roster", crate_level)
        .filter_module("roster_console", crate_level)
        .filter_module("roster_config", crate_level)
        .init();
}

fn load_config(cli: &Cli) -> anyhow::Result<ConfigLoad> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.with_config_path(path);
    }
    if let Some(path) = &cli.env_file {
        loader = loader.with_env_file(path);
    }
    if let Some(server) = &cli.server {
        loader = loader.with_server_url(server);
    }
    loader.load().context("failed to load configuration")
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if std::env::var("RUST_LOG").is_err() {
        init_logger(cli.verbose);
    } else {
        env_logger::init();
        log::debug!("Initialized logger from RUST_LOG");
    }

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let ConfigLoad { config, warnings } = load_config(&cli)?;
    for warning in &warnings.items {
        match &warning.hint {
            Some(hint) => log::warn!("{} ({})", warning.message, hint),
            None => log::warn!("{}", warning.message),
        }
    }
    log::debug!(
        "Using server {} (config file: {:?}, .env loaded: {})",
        config.server.base_url,
        config.metadata.config_path,
        config.metadata.env_file_loaded
    );

    let client = ApiClient::with_settings(
        &config.server,
        config.auth.credential.clone(),
    )
    .context("failed to build HTTP client")?;
    let service = Arc::new(AdminApiAdapter::new(Arc::new(client)));
    let state = AppState::new(ConsoleSettings::from_config(&config));
    let app = ConsoleApp::new(state, service, Arc::new(TextPresenter::stdout()));

    Ok(exit_code(execute(&app, cli.command).await))
}

/// `Ok(false)` means the command ran but did not do what was asked.
async fn execute(app: &ConsoleApp, command: Command) -> ConsoleResult<bool> {
    app.dispatch(Action::Identify).await?;
    let routes = app.state().settings.navigation.clone();

    if command.needs_console() && !app.state().identity.is_privileged() {
        app.open(&routes.console_path).await?;
        return Ok(false);
    }

    match command {
        Command::Whoami => {}
        Command::Profile => {
            app.open(&routes.profile_path).await?;
        }
        Command::Open { path } => {
            return Ok(matches!(
                app.open(&path).await?,
                NavigationOutcome::Entered(_) | NavigationOutcome::LoginBoundary(_)
            ));
        }
        Command::Roles => app.dispatch(Action::RefreshRoles).await?,
        Command::Users { action } => match action {
            UsersCommand::List => app.dispatch(Action::RefreshUsers).await?,
            UsersCommand::Show { id } => {
                app.dispatch(Action::ShowUser(id)).await?
            }
            UsersCommand::Create(args) => {
                app.dispatch(Action::SubmitCreate(args.to_draft())).await?
            }
            UsersCommand::Edit(args) => {
                app.dispatch(Action::OpenEdit(args.id)).await?;
                let Some(modal) = app.state().forms.edit_modal() else {
                    return Ok(false);
                };
                let draft = args.apply(&modal.draft);
                app.dispatch(Action::SubmitEdit(args.id, draft)).await?;
            }
            UsersCommand::Delete { id, yes } => {
                app.dispatch(Action::OpenDelete(id)).await?;
                if !yes {
                    eprintln!("Re-run with --yes to delete user {id}.");
                    app.dispatch(Action::CloseDelete).await?;
                    return Ok(false);
                }
                app.dispatch(Action::ConfirmDelete(id)).await?;
            }
        },
    }
    Ok(true)
}

fn exit_code(result: ConsoleResult<bool>) -> ExitCode {
    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(ConsoleError::Unauthorized) => ExitCode::from(EXIT_UNAUTHORIZED),
        Err(_) => ExitCode::FAILURE,
    }
}
