use std::io::Write;
use std::sync::Arc;

use polyver_backend::{Provider, ProviderError};
use polyver_core::{InstallType, Settings, Version, is_partial_version, resolve_version};

use crate::app::App;
use crate::cli::Command;
use crate::error::CliError;
use crate::path_installer::{EnsureDiscoverable, InstructionalPathInstaller, PathStatus};
use crate::shim;

pub async fn run(command: Command) -> Result<(), CliError> {
    let app = App::bootstrap()?;

    match command {
        Command::Init { user, yes } => init(&app, user, yes),
        Command::Install { runtime, version } => install(&app, &runtime, &version).await,
        Command::Uninstall {
            runtime,
            version,
            force,
        } => uninstall(&app, &runtime, &version, force),
        Command::List { runtime } => list(&app, runtime.as_deref()),
        Command::Available { runtime } => available(&app, &runtime).await,
        Command::Global { runtime, version } => global(&app, &runtime, version.as_deref()),
        Command::Local { runtime, version } => local(&app, &runtime, version.as_deref()),
        Command::Current { runtime } => current(&app, runtime.as_deref()),
        Command::Which { runtime } => which(&app, &runtime),
        Command::Reshim { runtime } => reshim(&app, runtime.as_deref()),
        Command::Migrate { runtime } => migrate(&app, &runtime),
    }
}

fn init(app: &App, user: bool, yes: bool) -> Result<(), CliError> {
    let shims_dir = app.paths.shims_dir();

    if !yes {
        println!(
            "This will create directories under {} and write shims to {}.",
            app.paths.data_dir.display(),
            shims_dir.display()
        );
        if !confirm("Continue?")? {
            println!("Aborted.");
            return Ok(());
        }
    }

    app.paths.ensure_dirs()?;

    let settings = Settings {
        install_type: if user {
            InstallType::User
        } else {
            InstallType::System
        },
    };
    settings.save(&app.paths.settings_file())?;

    let written = shim::write_all_shims(&app.registry, &shims_dir)?;
    println!("Wrote {written} shims to {}", shims_dir.display());

    let installer = InstructionalPathInstaller;
    if installer.ensure_discoverable(&shims_dir, settings.install_type)?
        == PathStatus::AlreadyOnPath
    {
        println!("Shims directory is already on PATH.");
    }

    Ok(())
}

async fn install(app: &App, runtime: &str, version: &str) -> Result<(), CliError> {
    let provider = app.provider(runtime)?;
    let resolved = resolve_against_available(provider, version).await?;

    match provider.install(&resolved).await {
        Ok(()) => {}
        Err(ProviderError::AlreadyInstalled { version }) => {
            println!("{} {version} is already installed.", provider.display_name());
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    }

    println!("Installed {} {resolved}", provider.display_name());

    // First install of a runtime becomes the global default so shims work
    // immediately.
    if provider.global_version()?.is_none() {
        provider.set_global_version(&resolved)?;
        println!("Set {} {resolved} as the global default", provider.display_name());
    }

    shim::write_provider_shims(provider.as_ref(), &app.paths.shims_dir())?;
    Ok(())
}

fn uninstall(app: &App, runtime: &str, version: &str, force: bool) -> Result<(), CliError> {
    let provider = app.provider(runtime)?;
    let resolved = resolve_against_installed(provider, version)?;

    let active = provider.current_version().ok();
    if !force && active.as_deref() == Some(resolved.as_str()) {
        println!(
            "{} {resolved} is the active version.",
            provider.display_name()
        );
        if !confirm("Remove it anyway?")? {
            println!("Aborted.");
            return Ok(());
        }
    }

    provider.uninstall(&resolved)?;
    println!("Uninstalled {} {resolved}", provider.display_name());
    Ok(())
}

fn list(app: &App, runtime: Option<&str>) -> Result<(), CliError> {
    for provider in targets(app, runtime)? {
        let installed = provider.list_installed()?;
        let global = provider.global_version()?;
        let local = provider.local_version()?;

        println!("{}:", provider.display_name());
        if installed.is_empty() {
            println!("  (none installed)");
            continue;
        }
        for entry in installed {
            let version = entry.version.to_string();
            let mut line = format!("  {version}");
            if global.as_deref() == Some(version.as_str()) {
                line.push_str(" 🌐 global");
            }
            if local.as_deref() == Some(version.as_str()) {
                line.push_str(" 📍 local");
            }
            println!("{line}");
        }
    }
    Ok(())
}

async fn available(app: &App, runtime: &str) -> Result<(), CliError> {
    let provider = app.provider(runtime)?;
    let available = provider.list_available().await?;

    println!("{}:", provider.display_name());
    for entry in available {
        let installed = provider.is_installed(&entry.version.to_string())?;
        let marker = if installed { " (installed)" } else { "" };
        println!("  {} [{}]{marker}", entry.version, entry.source);
    }
    Ok(())
}

fn global(app: &App, runtime: &str, version: Option<&str>) -> Result<(), CliError> {
    let provider = app.provider(runtime)?;
    match version {
        None => match provider.global_version()? {
            Some(version) => println!("{version}"),
            None => println!("(unset)"),
        },
        Some(input) => {
            let resolved = require_installed(provider, input)?;
            provider.set_global_version(&resolved)?;
            println!("{} global default is now {resolved}", provider.display_name());
        }
    }
    Ok(())
}

fn local(app: &App, runtime: &str, version: Option<&str>) -> Result<(), CliError> {
    let provider = app.provider(runtime)?;
    match version {
        None => match provider.local_version()? {
            Some(version) => println!("{version}"),
            None => println!("(unset)"),
        },
        Some(input) => {
            let resolved = require_installed(provider, input)?;
            provider.set_local_version(&resolved)?;
            println!(
                "{} pinned to {resolved} for this directory",
                provider.display_name()
            );
        }
    }
    Ok(())
}

fn current(app: &App, runtime: Option<&str>) -> Result<(), CliError> {
    for provider in targets(app, runtime)? {
        match provider.current_version() {
            Ok(version) => {
                let scope = if provider.local_version()?.as_deref() == Some(version.as_str()) {
                    "local"
                } else {
                    "global"
                };
                println!("{}: {version} ({scope})", provider.name());
            }
            Err(ProviderError::NoActiveVersion { .. }) => {
                println!("{}: (none)", provider.name());
            }
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}

fn which(app: &App, runtime: &str) -> Result<(), CliError> {
    let provider = app.provider(runtime)?;
    let version = provider.current_version()?;
    if !provider.is_installed(&version)? {
        return Err(ProviderError::SelectedVersionNotInstalled {
            runtime: provider.name(),
            version,
        }
        .into());
    }
    println!("{}", provider.executable_path(&version)?.display());
    Ok(())
}

fn reshim(app: &App, runtime: Option<&str>) -> Result<(), CliError> {
    let shims_dir = app.paths.shims_dir();
    let written = match runtime {
        Some(runtime) => shim::write_provider_shims(app.provider(runtime)?.as_ref(), &shims_dir)?,
        None => shim::write_all_shims(&app.registry, &shims_dir)?,
    };
    println!("Wrote {written} shims to {}", shims_dir.display());
    Ok(())
}

fn migrate(app: &App, runtime: &str) -> Result<(), CliError> {
    let provider = app.provider(runtime)?;
    let detected = provider.detect_installed();

    if detected.is_empty() {
        println!(
            "No existing {} installations found.",
            provider.display_name()
        );
        return Ok(());
    }

    println!("Found {} installations:", provider.display_name());
    for installation in detected {
        println!(
            "  {} {} at {}",
            installation.manager,
            installation.version.as_deref().unwrap_or("(unknown version)"),
            installation.path.display()
        );

        let packages = provider
            .global_packages(&installation.path)
            .unwrap_or_default();
        if !packages.is_empty() {
            println!(
                "    after installing with polyver, restore packages with: {}",
                provider.manual_package_install_command(&packages)
            );
        }
    }
    println!("Install a replacement with `polyver install {runtime} <version>`.");
    Ok(())
}

/// Every provider, or just the named one.
fn targets<'a>(
    app: &'a App,
    runtime: Option<&str>,
) -> Result<Vec<&'a Arc<dyn Provider>>, CliError> {
    match runtime {
        Some(runtime) => Ok(vec![app.provider(runtime)?]),
        None => Ok(app.registry.iter().collect()),
    }
}

/// Resolve user input against the versions the manifest chain offers.
/// Full versions pass through verbatim; the install itself validates them.
async fn resolve_against_available(
    provider: &Arc<dyn Provider>,
    input: &str,
) -> Result<String, CliError> {
    if !is_partial_version(input) {
        return Ok(input.trim_start_matches('v').to_string());
    }
    let available = provider.list_available().await?;
    let versions: Vec<Version> = available.into_iter().map(|entry| entry.version).collect();
    Ok(resolve_version(input, &versions).map_err(ProviderError::from)?)
}

/// Resolve user input against what is on disk.
fn resolve_against_installed(
    provider: &Arc<dyn Provider>,
    input: &str,
) -> Result<String, CliError> {
    if !is_partial_version(input) {
        return Ok(input.trim_start_matches('v').to_string());
    }
    let installed = provider.list_installed()?;
    let versions: Vec<Version> = installed.into_iter().map(|entry| entry.version).collect();
    Ok(resolve_version(input, &versions).map_err(ProviderError::from)?)
}

/// Resolve against installed versions and insist the result is present;
/// selections may only name versions that can actually dispatch.
fn require_installed(provider: &Arc<dyn Provider>, input: &str) -> Result<String, CliError> {
    let resolved = resolve_against_installed(provider, input)?;
    if !provider.is_installed(&resolved)? {
        return Err(ProviderError::NotInstalled { version: resolved }.into());
    }
    Ok(resolved)
}

fn confirm(prompt: &str) -> std::io::Result<bool> {
    print!("{prompt} [y/N] ");
    std::io::stdout().flush()?;

    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    let answer = answer.trim().to_ascii_lowercase();
    Ok(answer == "y" || answer == "yes")
}
