// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! rpglib CLI - load a module bundle into a simulated host and call its exports

mod call;
mod repl;

use anyhow::Context;
use clap::Parser;
use owo_colors::OwoColorize;
use rpglib_bundle::modules::{rpglib_bundle, rpglib_factories};
use rpglib_bundle::{
    Bundle, BundleManifest, EnvironmentAdapter, HostEnvironment, HostKind, LoaderConfig,
};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// CLI version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(
    name = "rpglib",
    about = "Load a module bundle into a simulated host and call its exports",
    version = VERSION,
    author = "Pegasus Heavy Industries"
)]
struct Cli {
    /// Bundle manifest (JSON); the built-in RPGLib bundle when omitted
    #[arg(short = 'm', long)]
    manifest: Option<PathBuf>,

    /// Host to load into (node, amd, browser, worker, bare)
    #[arg(long)]
    host: Option<HostKind>,

    /// Global property name used by the global scope fallback
    #[arg(long)]
    global_name: Option<String>,

    /// Accept manifests with dangling dependency edges
    #[arg(long)]
    lenient: bool,

    /// Evaluate a call expression, e.g. "div(10, 2)"
    #[arg(short = 'e', long = "eval")]
    eval: Option<String>,

    /// Start interactive REPL
    #[arg(short = 'i', long = "interactive")]
    interactive: bool,

    /// Print the bundle banner and exit
    #[arg(long)]
    banner: bool,

    /// List the bundle's modules and exit
    #[arg(long)]
    modules: bool,

    /// Enable verbose logging
    #[arg(long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = LoaderConfig::load().context("failed to load configuration")?;

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("rpglib=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Command line wins over config
    if let Some(manifest) = cli.manifest {
        config.manifest = Some(manifest);
    }
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(global_name) = cli.global_name {
        config.global_name = Some(global_name);
    }
    if cli.lenient {
        config.strict = false;
    }
    debug!(?config, "Effective configuration");

    let bundle = load_bundle(&config)?;

    if cli.banner || cli.modules {
        if cli.banner {
            println!("{}", bundle.banner());
        }
        if cli.modules {
            repl::print_modules(&bundle, None);
        }
        return Ok(());
    }

    let host = HostEnvironment::for_kind(config.host);
    let exposure = EnvironmentAdapter::default()
        .load(&bundle, &host)
        .with_context(|| format!("failed to load '{}' into a {} host", bundle.name(), config.host))?;
    let exports = host.exposed_exports(&exposure, bundle.global_name())?;

    let session = repl::Session {
        exposure: exposure.kind,
        package: exposure.package,
        exports,
        bundle,
    };

    if let Some(code) = cli.eval {
        run_eval(&session, &code);
    } else if cli.interactive || atty::is(atty::Stream::Stdin) {
        repl::Repl::new(session)?.run()?;
    } else {
        // Read calls from stdin, one per line
        let mut input = String::new();
        std::io::Read::read_to_string(&mut std::io::stdin(), &mut input)?;
        for line in input.lines().map(str::trim).filter(|line| !line.is_empty()) {
            run_eval(&session, line);
        }
    }

    Ok(())
}

/// The configured manifest, or the built-in library
fn load_bundle(config: &LoaderConfig) -> anyhow::Result<Bundle> {
    let bundle = match &config.manifest {
        Some(path) => {
            let manifest = BundleManifest::from_file(path)
                .with_context(|| format!("failed to read manifest {}", path.display()))?;
            Bundle::assemble(&manifest, &rpglib_factories(), config.strict)?
        }
        None => rpglib_bundle()?,
    };

    Ok(match &config.global_name {
        Some(global_name) => bundle.with_global_name(global_name.as_str()),
        None => bundle,
    })
}

fn run_eval(session: &repl::Session, code: &str) {
    match call::evaluate(&session.exports, session.bundle.global_name(), code) {
        Ok(result) => {
            if !result.is_undefined() {
                println!("{}", result);
            }
        }
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            std::process::exit(1);
        }
    }
}
