// Copyright 2026 Poison contributors
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

use clap::{Parser, Subcommand};
use poison_cli::commands;
use poison_cli::config::{Config, CONFIG_FILE};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "poison")]
#[command(version)]
#[command(about = "Directive-based view engine CLI", long_about = None)]
struct Cli {
    /// Log level: error, warn, info, debug, trace
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Path to the project configuration
    #[arg(short, long, global = true, default_value = CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a view and print the output
    Render {
        /// Dotted view name, e.g. pages.home
        view: String,
        /// Params as a JSON object
        #[arg(short, long)]
        params: Option<String>,
        /// Extra global as KEY=JSON (repeatable)
        #[arg(short, long = "global", value_name = "KEY=JSON")]
        globals: Vec<String>,
    },
    /// Print the Lua a view compiles to
    Compile {
        /// Dotted view name
        view: String,
    },
    /// Delete every compiled view
    ClearCache,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level)
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load_from(&cli.config)?;
    let mut stdout = std::io::stdout().lock();

    match cli.command {
        Commands::Render {
            view,
            params,
            globals,
        } => commands::render::run(&config, &view, params.as_deref(), &globals, &mut stdout),
        Commands::Compile { view } => commands::compile::run(&config, &view, &mut stdout),
        Commands::ClearCache => commands::clear_cache::run(&config).map(|_| ()),
    }
}
