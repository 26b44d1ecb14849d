//! The `polyver` binary. Invoked under its own name it is the CLI; invoked
//! under a shim name (a hard link or copy in the shims directory) it
//! dispatches straight to the selected runtime version.

use std::process::ExitCode;

use clap::Parser;

mod app;
mod cli;
mod commands;
mod error;
mod logging;
mod path_installer;
mod shim;

fn main() -> ExitCode {
    // Shim dispatch stays off the async runtime and the logger: it is on
    // the hot path of every `node`/`python`/`ruby` invocation.
    if let Some(shim_name) = shim::shim_name_from_argv0() {
        return shim::dispatch(&shim_name);
    }

    let cli = cli::Cli::parse();
    logging::init(cli.verbose);

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("polyver: failed to start async runtime: {err}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(commands::run(cli.command)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::debug!("Command failed: {err}");
            eprintln!("polyver: {err}");
            ExitCode::FAILURE
        }
    }
}
