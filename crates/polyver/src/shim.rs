use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use polyver_backend::{Provider, ProviderError, ProviderRegistry};

use crate::app::App;
use crate::error::CliError;

/// The shim name this process was invoked under, or `None` when it was
/// invoked as the CLI itself.
pub fn shim_name_from_argv0() -> Option<String> {
    let arg0 = std::env::args_os().next()?;
    let stem = Path::new(&arg0).file_stem()?.to_str()?;
    if stem == "polyver" {
        None
    } else {
        Some(stem.to_string())
    }
}

/// Run as a shim. Never falls back to a system-installed binary: an unset
/// or missing selection is a hard error so the failure mode is loud.
pub fn dispatch(shim: &str) -> ExitCode {
    match run_shim(shim) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("polyver: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Everything resolved before any process is started: the real binary, its
/// environment augmentation, the bin directory for PATH, and whether the
/// invocation may change the executable set.
struct Dispatch {
    target: PathBuf,
    bin_dir: PathBuf,
    env: HashMap<String, String>,
    runtime: &'static str,
    reshim_after_run: bool,
}

/// Resolve a shim invocation from `cwd` down to a runnable plan. Fails
/// before any child process exists: unknown shim, no selection, or a
/// selected version that is not on disk all stop here.
fn prepare_dispatch(
    registry: &ProviderRegistry,
    shim: &str,
    cwd: &Path,
    args: &[String],
) -> Result<Dispatch, CliError> {
    let provider = registry
        .by_shim(shim)
        .ok_or_else(|| CliError::UnknownShim(shim.to_string()))?;

    let version = provider.current_version_from(cwd)?;
    if !provider.is_installed(&version)? {
        return Err(ProviderError::SelectedVersionNotInstalled {
            runtime: provider.name(),
            version,
        }
        .into());
    }

    let exe = provider.executable_path(&version)?;
    let bin_dir = exe
        .parent()
        .ok_or_else(|| ProviderError::install_failed("dispatch", "executable has no parent"))?
        .to_path_buf();

    Ok(Dispatch {
        target: shim_target(&bin_dir, shim),
        env: provider.environment(&version)?,
        runtime: provider.name(),
        reshim_after_run: provider.should_reshim_after(shim, args),
        bin_dir,
    })
}

fn run_shim(shim: &str) -> Result<ExitCode, CliError> {
    let app = App::bootstrap()?;
    let cwd = std::env::current_dir()?;
    let args: Vec<String> = std::env::args().skip(1).collect();
    let dispatch = prepare_dispatch(&app.registry, shim, &cwd, &args)?;

    let mut command = std::process::Command::new(&dispatch.target);
    command.args(&args);
    for (key, value) in dispatch.env {
        command.env(key, value);
    }
    command.env("PATH", path_with(&dispatch.bin_dir));

    // exec replaces this process, which rules out the post-run reshim
    // check; invocations that may change the executable set take the
    // spawn-and-wait path on every platform.
    #[cfg(unix)]
    if !dispatch.reshim_after_run {
        use std::os::unix::process::CommandExt;
        // Only returns on failure.
        return Err(command.exec().into());
    }

    let status = command.status()?;
    if status.success() && dispatch.reshim_after_run {
        spawn_detached_reshim(dispatch.runtime);
    }
    Ok(exit_code_of(status))
}

fn exit_code_of(status: std::process::ExitStatus) -> ExitCode {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return ExitCode::from(u8::try_from(128 + signal).unwrap_or(u8::MAX));
        }
    }
    ExitCode::from(u8::try_from(status.code().unwrap_or(1)).unwrap_or(1))
}

/// The real binary behind a shim name inside the version's bin directory.
fn shim_target(bin_dir: &Path, shim: &str) -> PathBuf {
    if cfg!(windows) {
        for ext in ["exe", "cmd", "bat"] {
            let candidate = bin_dir.join(format!("{shim}.{ext}"));
            if candidate.is_file() {
                return candidate;
            }
        }
    }
    bin_dir.join(shim)
}

/// PATH with the version's bin directory prepended, so child processes the
/// runtime spawns resolve companions from the same installation.
fn path_with(bin_dir: &Path) -> std::ffi::OsString {
    let mut entries = vec![bin_dir.to_path_buf()];
    if let Some(existing) = std::env::var_os("PATH") {
        entries.extend(std::env::split_paths(&existing));
    }
    std::env::join_paths(entries).unwrap_or_else(|_| bin_dir.as_os_str().to_os_string())
}

fn spawn_detached_reshim(runtime: &str) {
    use std::process::Stdio;
    if let Ok(exe) = std::env::current_exe() {
        let _ = std::process::Command::new(exe)
            .args(["reshim", runtime])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
    }
}

/// Materialize one shim per registered shim name by hard-linking the
/// current executable into the shims directory, copying when linking is
/// not supported.
pub fn write_all_shims(registry: &ProviderRegistry, shims_dir: &Path) -> Result<usize, CliError> {
    let exe = std::env::current_exe()?;
    std::fs::create_dir_all(shims_dir)?;

    let mut written = 0;
    for name in registry.all_shims() {
        write_shim(&exe, shims_dir, name)?;
        written += 1;
    }
    Ok(written)
}

/// Like `write_all_shims` but for a single provider's shims.
pub fn write_provider_shims(provider: &dyn Provider, shims_dir: &Path) -> Result<usize, CliError> {
    let exe = std::env::current_exe()?;
    std::fs::create_dir_all(shims_dir)?;

    for name in provider.shims() {
        write_shim(&exe, shims_dir, name)?;
    }
    Ok(provider.shims().len())
}

fn write_shim(exe: &Path, shims_dir: &Path, name: &str) -> std::io::Result<()> {
    let target = shims_dir.join(format!("{name}{}", std::env::consts::EXE_SUFFIX));
    if target.exists() {
        std::fs::remove_file(&target)?;
    }
    if std::fs::hard_link(exe, &target).is_err() {
        std::fs::copy(exe, &target)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use polyver_backend::COMPLETE_MARKER;
    use polyver_core::AppPaths;
    use polyver_manifest::EmbeddedSource;

    use super::*;
    use crate::app::build_registry;

    fn paths(root: &Path) -> AppPaths {
        AppPaths {
            config_dir: root.join("config"),
            cache_dir: root.join("cache"),
            data_dir: root.join("data"),
        }
    }

    fn registry_in(root: &Path) -> ProviderRegistry {
        build_registry(&paths(root), Arc::new(EmbeddedSource::new())).unwrap()
    }

    fn select_global(root: &Path, runtime: &str, version: &str) {
        let file = paths(root).global_versions_file();
        std::fs::create_dir_all(file.parent().unwrap()).unwrap();
        std::fs::write(file, format!("{{\"{runtime}\":\"{version}\"}}")).unwrap();
    }

    fn complete_install(root: &Path, runtime: &str, version: &str) -> PathBuf {
        let install = paths(root).runtime_installs_dir(runtime).join(version);
        std::fs::create_dir_all(install.join("bin")).unwrap();
        std::fs::write(install.join(COMPLETE_MARKER), "").unwrap();
        install
    }

    #[test]
    fn unknown_shim_names_are_rejected() {
        let temp = tempfile::tempdir().expect("temporary directory should be created");
        let registry = registry_in(temp.path());

        assert!(matches!(
            prepare_dispatch(&registry, "cargo", temp.path(), &[]),
            Err(CliError::UnknownShim(_))
        ));
    }

    #[test]
    fn dispatch_without_a_selection_fails_before_any_process_starts() {
        let temp = tempfile::tempdir().expect("temporary directory should be created");
        let registry = registry_in(temp.path());

        assert!(matches!(
            prepare_dispatch(&registry, "node", temp.path(), &[]),
            Err(CliError::Provider(ProviderError::NoActiveVersion {
                runtime: "node"
            }))
        ));
    }

    #[test]
    fn selected_but_missing_version_is_a_hard_error_not_a_fallback() {
        let temp = tempfile::tempdir().expect("temporary directory should be created");
        let registry = registry_in(temp.path());
        select_global(temp.path(), "node", "22.15.1");

        assert!(matches!(
            prepare_dispatch(&registry, "node", temp.path(), &[]),
            Err(CliError::Provider(
                ProviderError::SelectedVersionNotInstalled { runtime: "node", .. }
            ))
        ));
    }

    #[test]
    fn installed_selection_resolves_to_a_runnable_plan() {
        let temp = tempfile::tempdir().expect("temporary directory should be created");
        let registry = registry_in(temp.path());
        select_global(temp.path(), "ruby", "3.3.6");
        let install = complete_install(temp.path(), "ruby", "3.3.6");

        let plan = prepare_dispatch(&registry, "ruby", temp.path(), &[]).unwrap();
        assert_eq!(plan.runtime, "ruby");
        assert_eq!(plan.bin_dir, install.join("bin"));
        assert!(plan.target.starts_with(&plan.bin_dir));
        assert!(plan.env.contains_key("GEM_HOME"));
        assert!(!plan.reshim_after_run);
    }

    #[test]
    fn package_mutations_are_flagged_for_a_post_run_reshim() {
        let temp = tempfile::tempdir().expect("temporary directory should be created");
        let registry = registry_in(temp.path());
        select_global(temp.path(), "node", "22.15.1");
        complete_install(temp.path(), "node", "22.15.1");

        let args: Vec<String> = ["install", "-g", "typescript"]
            .iter()
            .map(ToString::to_string)
            .collect();
        let plan = prepare_dispatch(&registry, "npm", temp.path(), &args).unwrap();
        assert!(plan.reshim_after_run);

        let plan = prepare_dispatch(&registry, "npm", temp.path(), &[]).unwrap();
        assert!(!plan.reshim_after_run);
    }

    #[test]
    fn shims_are_materialized_under_their_own_names() {
        let temp = tempfile::tempdir().expect("temporary directory should be created");
        let exe = std::env::current_exe().unwrap();

        write_shim(&exe, temp.path(), "node").unwrap();
        write_shim(&exe, temp.path(), "node").unwrap();

        let shim = temp
            .path()
            .join(format!("node{}", std::env::consts::EXE_SUFFIX));
        assert!(shim.is_file());
    }

    #[test]
    fn path_with_puts_the_bin_dir_first() {
        let bin_dir = Path::new("/opt/polyver/installs/node/22.15.1/bin");
        let joined = path_with(bin_dir);
        let first = std::env::split_paths(&joined).next().unwrap();
        assert_eq!(first, bin_dir);
    }
}
