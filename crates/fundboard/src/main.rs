//! `fundboard` - CLI for the fundraising site
//!
//! Runs the web server and offers a few maintenance commands for inspecting
//! configuration and project progress from a terminal.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use anyhow::Context;
use clap::Parser;
use tracing::warn;

use fundboard::cli::{Cli, Command, ConfigCommand, ProjectsCommand, ServeCommand};
use fundboard::dashboard::project_views;
use fundboard::web::{self, AppState};
use fundboard::{init_logging, Config, ProjectStore};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone()).context("failed to load configuration")?;

    match cli.command {
        Command::Serve(serve_cmd) => handle_serve(config, serve_cmd),
        Command::Projects(projects_cmd) => handle_projects(&config, &projects_cmd),
        Command::Config(config_cmd) => handle_config(&config, config_cmd),
    }
}

fn handle_serve(mut config: Config, cmd: ServeCommand) -> anyhow::Result<()> {
    if let Some(host) = cmd.host {
        config.server.host = host;
    }
    if let Some(port) = cmd.port {
        config.server.port = port;
    }

    if config.uses_default_password() {
        warn!("Admin password is the shipped default; set FUNDBOARD_ADMIN__PASSWORD");
    }

    let state = AppState::from_config(&config).with_context(|| {
        format!(
            "failed to open project store at {}",
            config.projects_path().display()
        )
    })?;

    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    runtime
        .block_on(web::serve(state, &config.address()))
        .with_context(|| format!("server error on {}", config.address()))?;
    Ok(())
}

fn handle_projects(config: &Config, cmd: &ProjectsCommand) -> anyhow::Result<()> {
    let store = ProjectStore::open_file(config.projects_path()).with_context(|| {
        format!(
            "failed to open project store at {}",
            config.projects_path().display()
        )
    })?;
    let views = project_views(&store, &config.link_table())?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&views)?);
        return Ok(());
    }

    println!(
        "{:<20} {:>10} {:>10} {:>5}  {}",
        "SLUG", "RAISED", "TARGET", "%", "TITLE"
    );
    for view in &views {
        println!(
            "{:<20} {:>10} {:>10} {:>4}%  {}",
            view.slug, view.raised, view.target, view.percent, view.title
        );
        if !view.donate_url.is_empty() {
            println!("{:<20} donate: {}", "", view.donate_url);
        }
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Server]");
                println!("  Address:            {}", config.address());
                println!();
                println!("[Storage]");
                println!("  Data directory:     {}", config.data_dir().display());
                println!("  Projects file:      {}", config.projects_path().display());
                println!("  Contact log:        {}", config.contacts_path().display());
                println!();
                println!("[Admin]");
                println!("  User:               {}", config.admin.user);
                println!(
                    "  Default password:   {}",
                    if config.uses_default_password() { "yes" } else { "no" }
                );
                println!();
                println!("[Donation links]");
                for (key, url) in config.link_table().iter() {
                    println!("  {key:<18}  {url}");
                }
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
