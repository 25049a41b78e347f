// SPDX-License-Identifier: MIT OR Apache-2.0

mod config;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use liblive_catalog::{
    Catalog, CatalogListing, DetectionOutcome, DownloadSelector, Edition, JsonOutput,
    KvCatalogStore, OsClass, PersistStatus, ResolvedDownload, Verbosity, Version, detect_latest,
    group_by_major, load_catalog, server,
};

use crate::config::{CliConfig, parse_bind};

mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const PARTIAL_FAILURE: i32 = 1;
    pub const FATAL_ERROR: i32 = 2;
}

mod ansi {
    pub const BOLD: &str = "\x1b[1m";
    pub const RESET: &str = "\x1b[0m";

    #[inline]
    pub fn bold(s: &str) -> String {
        format!("{BOLD}{s}{RESET}")
    }
}

#[derive(Parser)]
#[command(name = "live-catalog")]
#[command(about = "browse ableton live releases and resolve their download links")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// output results as json
    #[arg(long, global = true)]
    json: bool,

    /// open configuration file in editor
    #[arg(long)]
    edit_config: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// list known releases grouped by major version
    List,
    /// check the release notes for a newer release and add it to the catalog
    Detect,
    /// print the download link for a release
    Resolve {
        /// release, e.g. 12.3.1
        version: String,

        /// windows, mac_intel or mac_arm [default: this machine]
        #[arg(long)]
        os: Option<String>,

        /// pick the os from a browser user agent instead
        #[arg(long, conflicts_with = "os")]
        user_agent: Option<String>,

        /// intro, standard, suite, lite or trial
        #[arg(long, default_value = "suite")]
        edition: String,
    },
    /// serve the catalog endpoints over the local store
    Serve {
        /// address to listen on [default: from config, else 127.0.0.1:8787]
        #[arg(long)]
        bind: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    if cli.edit_config {
        if let Err(e) = CliConfig::edit_config() {
            output_error(&cli, &e.to_string());
            std::process::exit(exit_codes::FATAL_ERROR);
        }
        return;
    }

    let config = match CliConfig::load() {
        Ok(c) => c,
        Err(e) => {
            output_error(&cli, &format!("failed to load config: {e}"));
            std::process::exit(exit_codes::FATAL_ERROR);
        }
    };

    let verbosity = if cli.verbose {
        Verbosity::Verbose
    } else {
        config.verbosity
    };

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(verbosity.log_filter()),
    )
    .format_timestamp(None)
    .init();

    let result = match cli.command.as_ref().unwrap_or(&Commands::List) {
        Commands::List => cmd_list(&cli, &config, verbosity),
        Commands::Detect => cmd_detect(&cli, &config, verbosity),
        Commands::Resolve {
            version,
            os,
            user_agent,
            edition,
        } => cmd_resolve(
            &cli,
            version,
            os.as_deref(),
            user_agent.as_deref(),
            edition,
        ),
        Commands::Serve { bind } => cmd_serve(&config, bind.as_deref()),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            output_error(&cli, &e.to_string());
            let code = if e.is_validation() {
                exit_codes::PARTIAL_FAILURE
            } else {
                exit_codes::FATAL_ERROR
            };
            std::process::exit(code);
        }
    }
}

fn output_error(cli: &Cli, msg: &str) {
    if cli.json {
        let output: JsonOutput<()> = JsonOutput::err(msg);
        if let Ok(json) = serde_json::to_string(&output) {
            println!("{json}");
        }
    } else {
        eprintln!("{} {msg}", ansi::bold("error:"));
    }
}

fn cmd_list(cli: &Cli, config: &CliConfig, verbosity: Verbosity) -> liblive_catalog::Result<i32> {
    let catalog = load_catalog(&config.inner)?;

    if cli.json {
        let output = JsonOutput::ok(CatalogListing::new(&catalog));
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(exit_codes::SUCCESS);
    }

    if verbosity == Verbosity::Quiet {
        println!("{}", catalog.len());
        return Ok(exit_codes::SUCCESS);
    }

    print_groups(&catalog, verbosity);
    Ok(exit_codes::SUCCESS)
}

fn print_groups(catalog: &Catalog, verbosity: Verbosity) {
    let latest = catalog.latest();

    for group in group_by_major(catalog) {
        println!("{}", ansi::bold(&group.label()));

        if verbosity == Verbosity::Verbose {
            for version in &group.versions {
                let marker = if Some(version) == latest { "  (latest)" } else { "" };
                println!("  {version}{marker}");
            }
        } else {
            let line: Vec<&str> = group.versions.iter().map(Version::as_str).collect();
            println!("  {}", line.join("  "));
        }
        println!();
    }

    println!(
        "{} {} release(s), latest {}",
        ansi::bold("info:"),
        catalog.len(),
        latest.map(Version::as_str).unwrap_or("-")
    );
}

fn cmd_detect(
    cli: &Cli,
    config: &CliConfig,
    verbosity: Verbosity,
) -> liblive_catalog::Result<i32> {
    let outcome = detect_latest(&config.inner)?;

    if cli.json {
        let output = match &outcome {
            Some(outcome) => JsonOutput::ok(outcome),
            None => JsonOutput::err("no release detected"),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(detect_exit_code(outcome.as_ref()));
    }

    match &outcome {
        None => {
            if verbosity != Verbosity::Quiet {
                println!(
                    "{} no release detected on {}",
                    ansi::bold("info:"),
                    config.release_notes_url
                );
            }
        }
        Some(outcome) if verbosity == Verbosity::Quiet => println!("{}", outcome.version),
        Some(outcome) => match &outcome.status {
            PersistStatus::AlreadyKnown => println!(
                "{} latest release {} is already in the catalog",
                ansi::bold("info:"),
                outcome.version
            ),
            PersistStatus::Saved => println!(
                "{} added {} to the catalog ({} release(s))",
                ansi::bold("success:"),
                outcome.version,
                outcome.catalog.len()
            ),
            PersistStatus::SaveFailed(reason) => eprintln!(
                "{} detected {} but could not save it: {reason}",
                ansi::bold("failed:"),
                outcome.version
            ),
        },
    }

    Ok(detect_exit_code(outcome.as_ref()))
}

fn detect_exit_code(outcome: Option<&DetectionOutcome>) -> i32 {
    match outcome {
        Some(outcome) if !outcome.is_new() || outcome.is_saved() => exit_codes::SUCCESS,
        _ => exit_codes::PARTIAL_FAILURE,
    }
}

fn cmd_resolve(
    cli: &Cli,
    version: &str,
    os: Option<&str>,
    user_agent: Option<&str>,
    edition: &str,
) -> liblive_catalog::Result<i32> {
    let os: OsClass = match (os, user_agent) {
        (Some(os), _) => os.parse()?,
        (None, Some(ua)) => OsClass::from_user_agent(ua),
        (None, None) => OsClass::host(),
    };
    let selector = DownloadSelector::new(Version::parse(version)?, os, edition.parse::<Edition>()?);

    if cli.json {
        let output = JsonOutput::ok(ResolvedDownload::from(&selector));
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(exit_codes::SUCCESS);
    }

    log::debug!(
        "**resolve:** {} for {}",
        selector.label(),
        selector.os.display_name()
    );
    println!("{}", selector.download_url());
    Ok(exit_codes::SUCCESS)
}

fn cmd_serve(config: &CliConfig, bind: Option<&str>) -> liblive_catalog::Result<i32> {
    let addr = match bind {
        Some(bind) => parse_bind(bind)?,
        None => config.bind,
    };

    let data_dir = config.data_dir();
    log::info!("**serve:** catalog stored in {}", data_dir.display());

    server::serve_blocking(addr, Arc::new(KvCatalogStore::open(data_dir)))?;
    Ok(exit_codes::SUCCESS)
}
