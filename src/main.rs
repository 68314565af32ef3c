use clap::Parser;
use colored::*;
use env_logger::{Builder, Env, Target};
use log::{debug, info};
use std::fs;
use std::io;
use std::process;
use std::time::Instant;
use websearch::config::{build_engine_table, Config, Environment};
use websearch::error::{Result as WebSearchResult, WebSearchError};
use websearch::{Action, Cli, DryRunLauncher, Launcher, Opener, Outcome, Resolver, SystemLauncher};

fn main() {
    let cli = Cli::parse();
    if let Err(e) = setup_logging(&cli) {
        eprintln!("{} {e}", "error:".red().bold());
        process::exit(1);
    }

    let start_time = Instant::now();
    info!("Invoked with {:?}", cli.action());

    match run(&cli) {
        Ok(outcome) => {
            if let Some(url) = outcome.url() {
                if !cli.dry_run {
                    println!("{} {url}", "Opened".green());
                }
            }
            debug!("Finished as {outcome:?} in {:.2?}", start_time.elapsed());
        }
        Err(e) => {
            debug!("Failed after {:.2?}", start_time.elapsed());
            eprintln!("{} {e}", "error:".red().bold());
            process::exit(1);
        }
    }
}

fn run(cli: &Cli) -> WebSearchResult<Outcome> {
    match cli.action() {
        // Help must work even when the configuration is broken.
        Action::Help => Resolver::help(&mut io::stdout().lock()),
        Action::List => build_resolver(cli)?.list_engines(&mut io::stdout().lock()),
        Action::Search { engine, query } => build_resolver(cli)?.resolve(&engine, &query),
        Action::OpenTarget(target) => build_resolver(cli)?.open_target(&target),
    }
}

fn build_resolver(cli: &Cli) -> WebSearchResult<Resolver> {
    let environment = Environment::from_process();
    debug!("Environment: {environment:?}");

    let config_path = cli.config.clone().or_else(|| environment.config_path.clone());
    let config = Config::load(config_path.as_deref())?;
    let table = build_engine_table(&config, &environment)?;
    info!("Loaded {} engines", table.len());

    let launcher: Box<dyn Launcher> = if cli.dry_run {
        Box::new(DryRunLauncher)
    } else {
        Box::new(SystemLauncher)
    };
    let opener = Opener::new(launcher, environment.host_info(&config));

    Ok(Resolver::new(table, opener).with_charset(environment.charset))
}

fn setup_logging(cli: &Cli) -> WebSearchResult<()> {
    let default_level = if cli.verbose { "debug" } else { "warn" };
    let mut builder = Builder::from_env(Env::default().default_filter_or(default_level));

    builder.format(|buf, record| {
        use std::io::Write;
        writeln!(
            buf,
            "{} [{}] [{}] {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            record.level(),
            record.module_path().unwrap_or("unknown"),
            record.args()
        )
    });

    if let Some(log_path) = &cli.log {
        if let Some(parent_dir) = log_path.parent() {
            if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
                fs::create_dir_all(parent_dir).map_err(WebSearchError::Io)?;
            }
        }
        let log_file = fs::File::create(log_path).map_err(WebSearchError::Io)?;
        builder.target(Target::Pipe(Box::new(log_file)));
    } else {
        builder.target(Target::Stderr);
    }

    builder
        .try_init()
        .map_err(|e| WebSearchError::Anyhow(e.into()))?;
    Ok(())
}
