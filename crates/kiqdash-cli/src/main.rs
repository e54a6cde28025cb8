// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;

use anyhow::{Context, Result, anyhow};
use config::Config;
use kiqdash_store::Store;
use kiqdash_tui::{App, AppOptions};
use runtime::{DemoGateway, StoreGateway};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

const DEMO_SEED: u64 = 42;

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
    if options.show_version {
        println!("kiqdash {}", env!("CARGO_PKG_VERSION"));
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
            "load config {}; run `kiqdash --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;

    let log_path = options.log_file.clone().or_else(|| config.log_path());
    logging::init(log_path.as_deref(), config.log_level())?;

    let app_options = AppOptions {
        theme: config.theme(),
        refresh_interval: config.refresh_interval()?,
    };

    if options.demo {
        if options.check_only {
            return Ok(());
        }
        info!(seed = DEMO_SEED, "starting with demo cluster");
        let mut app = App::new(app_options);
        return kiqdash_tui::run_app(&mut app, Arc::new(DemoGateway::new(DEMO_SEED)));
    }

    let redis_url = options
        .redis_url
        .clone()
        .unwrap_or_else(|| config.redis_url());
    let store = Store::open(&redis_url, config.redis_timeout()?).with_context(|| {
        format!("open redis {redis_url:?} -- set [redis].url, REDIS_URL, or --redis-url")
    })?;
    if options.check_only {
        return store
            .ping()
            .with_context(|| format!("check redis {redis_url:?}"));
    }

    info!(redis = %redis_url, "starting");
    let mut app = App::new(app_options);
    kiqdash_tui::run_app(&mut app, Arc::new(StoreGateway::new(store)))
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    redis_url: Option<String>,
    log_file: Option<PathBuf>,
    print_config_path: bool,
    demo: bool,
    print_example: bool,
    check_only: bool,
    show_version: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        redis_url: None,
        log_file: None,
        print_config_path: false,
        demo: false,
        print_example: false,
        check_only: false,
        show_version: false,
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
            "--redis-url" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--redis-url requires a url"))?;
                kiqdash_store::validate_redis_url(value.as_ref())?;
                options.redis_url = Some(value.as_ref().trim().to_owned());
            }
            "--log-file" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--log-file requires a file path"))?;
                options.log_file = Some(PathBuf::from(value.as_ref()));
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
            "--version" | "-V" => {
                options.show_version = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("kiqdash: terminal dashboard for Redis-backed job queues");
    println!("  --config <path>          Use a specific config path");
    println!("  --redis-url <url>        Connect to this Redis instead of the configured one");
    println!("  --log-file <path>        Write logs to a file (filter with KIQDASH_LOG)");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a config template");
    println!("  --demo                   Watch a generated cluster instead of Redis");
    println!("  --check                  Validate config and Redis connectivity, then exit");
    println!("  --version                Print version");
    println!("  --help                   Show this help");
}
