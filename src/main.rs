use anyhow::Result;
use clap::Parser;
use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;

use playlint::cli::{Cli, Commands};
use playlint::config::{Config, CONFIG_FILE};
use playlint::engine;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Check {
            path,
            format,
            config,
            fail_on,
        } => {
            let project_root = path.canonicalize().unwrap_or(path);
            let cfg = Config::load(config.as_deref(), &project_root)?;
            let result = engine::run(&project_root, &cfg)?;

            let output_format = format.unwrap_or(cfg.format);
            playlint::cli::output::render(&result, &project_root, output_format);

            if result.has_severity_at_least(fail_on) {
                std::process::exit(1);
            }
        }
        Commands::Init => {
            let path = std::env::current_dir()?.join(CONFIG_FILE);
            if path.exists() {
                eprintln!("{CONFIG_FILE} already exists");
                std::process::exit(1);
            }
            std::fs::write(&path, Config::default_toml())?;
            println!("Created {CONFIG_FILE}");
        }
        Commands::Explain { rule: None } => {
            println!("{}", playlint::cli::explain::list_rules());
        }
        Commands::Explain { rule: Some(rule) } => {
            use playlint::cli::explain::{explain, list_rules, suggest};
            match explain(&rule) {
                Some(text) => println!("{text}"),
                None => {
                    eprintln!("Unknown rule: {rule}");
                    if let Some(close) = suggest(&rule) {
                        eprintln!("Did you mean `{close}`?");
                    }
                    eprintln!();
                    eprintln!("{}", list_rules());
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
