// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod runtime;

use anyhow::{Context, Result, anyhow};
use chatrecap_api::{Client, ServiceError};
use chatrecap_app::AppState;
use chatrecap_tui::UiOptions;
use config::Config;
use runtime::{DemoRuntime, ServiceRuntime};
use std::env;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::FmtSubscriber;

const LOG_ENV: &str = "CHATRECAP_LOG";
const DEMO_SOURCE: &str = "demo-chat.txt";

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `chatrecap --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;

    let log_file = config.log_file()?;
    init_logging(&log_file, config.log_level())
        .with_context(|| format!("open log file {}", log_file.display()))?;

    let base_url = config.service_base_url();
    let client = Client::new(&base_url, config.service_timeout()?).with_context(|| {
        format!(
            "invalid [service] config in {}; fix base_url/timeout values",
            options.config_path.display()
        )
    })?;

    if options.check_only {
        return check_service(&client);
    }

    let ui_options = UiOptions {
        step_debounce: config.step_debounce()?,
        export_dir: config.export_dir()?,
        initial_file: options
            .file
            .or_else(|| options.demo.then(|| PathBuf::from(DEMO_SOURCE))),
    };
    info!(
        base_url = %client.base_url(),
        timeout = ?client.timeout(),
        demo = options.demo,
        log = %log_file.display(),
        "starting chatrecap"
    );

    let mut state = AppState::default();
    if options.demo {
        let mut runtime = DemoRuntime::new();
        chatrecap_tui::run_app(&mut state, &mut runtime, ui_options)
    } else {
        let mut runtime = ServiceRuntime::new(client);
        chatrecap_tui::run_app(&mut state, &mut runtime, ui_options)
    }
}

/// Logs go to a file; the terminal belongs to the UI.
fn init_logging(path: &Path, level: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open {}", path.display()))?;

    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(level))
        .with_context(|| format!("invalid log level {level:?}"))?;
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|error| anyhow!("install log subscriber: {error}"))?;
    Ok(())
}

/// Any HTTP answer proves the service is up; only a failed connection is fatal.
fn check_service(client: &Client) -> Result<()> {
    match client.available_years("") {
        Ok(_) | Err(ServiceError::Status { .. } | ServiceError::Decode { .. }) => {
            println!("analysis service reachable at {}", client.base_url());
            Ok(())
        }
        Err(error) => Err(anyhow!(error)),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    file: Option<PathBuf>,
    print_config_path: bool,
    demo: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        file: None,
        print_config_path: false,
        demo: false,
        print_example: false,
        check_only: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--file" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--file requires a chat export path"))?;
                set_file(&mut options, value.as_ref())?;
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--demo" => {
                options.demo = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown if unknown.starts_with('-') => {
                return Err(anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
            path => set_file(&mut options, path)?,
        }
    }

    Ok(options)
}

fn set_file(options: &mut CliOptions, value: &str) -> Result<()> {
    if options.file.is_some() {
        return Err(anyhow!(
            "only one chat export can be opened at a time, got a second one: {value:?}"
        ));
    }
    options.file = Some(PathBuf::from(value));
    Ok(())
}

fn print_help() {
    println!("chatrecap [<file>]");
    println!("  <file>, --file <path>    Open a chat export right away");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --demo                   Browse seeded demo data without a service");
    println!("  --check                  Validate config and reach the analysis service");
    println!("  --help                   Show this help");
}
