use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use unbox_archive::Inventory;
use unbox_install::post::{LauncherHook, ScriptHook, UninstallerHook};
use unbox_install::{Installer, InstallerConfig};

use crate::cli::App;
use crate::frontend::{CliFrontend, Frontend, Outcome};

mod cli;
mod frontend;
mod logging;
mod tracker;

fn main() -> ExitCode {
    match run(App::parse()) {
        Ok(code) => code,
        Err(e) => {
            log::error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(app: App) -> Result<ExitCode> {
    if let Err(e) = logging::init(Path::new(logging::LOG_FILE)) {
        eprintln!("Warning: {:#}", e);
    }

    let resources = app.resources_dir()?;
    let mut config = InstallerConfig::load(&resources)?;
    config.no_launcher = app.no_launcher;
    if let Some(name) = std::env::args().next() {
        config.variables.entry("installerName".to_string()).or_insert(name);
    }

    if app.license {
        let path = cli::license_path(&resources, &app.lang);
        let text =
            std::fs::read_to_string(&path).with_context(|| format!("Failed to read license {}", path.display()))?;
        println!("{}", text);
        return Ok(ExitCode::SUCCESS);
    }

    let Some(target) = app.target.clone() else {
        // no graphical frontend is built in
        App::command().print_help()?;
        if let Some(dir) = config.default_install_dir() {
            println!("\nSuggested install directory: {}", dir.display());
        }
        return Ok(ExitCode::FAILURE);
    };

    if config.must_accept_license_on_cli && !app.accept {
        eprintln!(
            "The license agreement must be accepted with --accept. Print it with --license --lang {}.",
            app.lang
        );
        return Ok(ExitCode::FAILURE);
    }

    let installer = Installer::new(open_payload(&app, &config)?);
    installer.set_variables(config.variables.clone());
    installer.set_create_launcher(!config.no_launcher);
    installer.add_hook(LauncherHook::new());
    installer.add_hook(UninstallerHook);
    installer.add_hook(ScriptHook::new(resources.join("hooks")));

    let canceller = installer.canceller();
    if let Err(e) = ctrlc::set_handler(move || {
        eprintln!("\nInterrupted, rolling back...");
        canceller.cancel();
    }) {
        log::warn!("cannot install Ctrl-C handler: {}", e);
    }

    let outcome = CliFrontend::new(target).present(&installer);
    log::info!("installer finished: {:?}", outcome);
    if outcome == Outcome::Installed && app.run {
        installer
            .exec_installed()
            .context("Failed to start the installed application")?;
    }
    Ok(outcome.exit_code())
}

fn open_payload(app: &App, config: &InstallerConfig) -> Result<Inventory> {
    let mut inventory = if app.reads_stdin() {
        Inventory::from_bundle(std::io::stdin().lock()).context("Failed to stage payload from stdin")?
    } else {
        let path = app.payload_path()?;
        Inventory::open(&path).with_context(|| format!("Failed to open payload {}", path.display()))?
    };
    if let Some(subdir) = &config.subdir {
        inventory.set_subdir(subdir);
    }
    Ok(inventory)
}
