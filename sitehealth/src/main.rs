use clap::ArgMatches;
use commands::command_argument_builder;
use indicatif::{ProgressBar, ProgressStyle};
use sitehealth::config::{CliOverrides, Config};
use sitehealth::handlers;
use sitehealth_core::{data::Database, print_banner};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;
use url::Url;

mod commands;

#[tokio::main]
async fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");

    // Show banner unless --quiet flag is set
    if !quiet {
        print_banner();
    }

    if chosen_command.subcommand().is_none() {
        // No subcommand provided, just show the banner
        return;
    }

    match chosen_command.subcommand() {
        Some(("init", primary_command)) => handle_init(primary_command),
        Some(("crawl", primary_command)) => handle_crawl(primary_command, quiet).await,
        Some(("report", primary_command)) => handle_report(primary_command),
        _ => unreachable!("clap should ensure we don't get here"),
    }
}

// Handler functions
fn handle_init(args: &ArgMatches) {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message("Setting up sitehealth...");

    let dir_arg = args.get_one::<String>("PATH").unwrap();
    let force = args.get_flag("force");
    let expanded_config_dir = shellexpand::tilde(dir_arg);
    let config_dir = Path::new(expanded_config_dir.as_ref());
    let db_path = config_dir.join("sitehealth.db");

    if Database::exists(&db_path) && !force {
        spinner.println(format!(
            "[WARNING] A database already exists at: {}",
            db_path.display()
        ));
        spinner.println("This operation will overwrite it.");
        spinner.println("Do you want to continue? [y/N]: ");
        io::stdout().flush().unwrap();

        let mut response = String::new();
        io::stdin().read_line(&mut response).unwrap();
        let response = response.trim().to_lowercase();

        if response != "y" && response != "yes" {
            spinner.finish_with_message("Initialization cancelled.");
            return;
        }
    }

    spinner.set_message("Creating configuration directory...");
    fs::create_dir_all(config_dir).expect("Failed to create config directory");

    if Database::exists(&db_path) {
        spinner.set_message("Deleting existing database...");
        Database::drop(&db_path);
    }

    spinner.set_message(format!("Initializing database at: {}", db_path.display()));
    Database::new(&db_path).expect("Failed to create database");

    spinner.finish_with_message(format!(
        r#"
    sitehealth initialization complete!
    Config directory: {}
    Database: {}
    "#,
        config_dir.display(),
        db_path.display()
    ));
}

async fn handle_crawl(sub_matches: &ArgMatches, quiet: bool) {
    // Initialize tracing for logging
    tracing_subscriber::fmt::init();

    let overrides = CliOverrides {
        url: sub_matches.get_one::<Url>("URL").map(|u| u.to_string()),
        depth: sub_matches.get_one::<usize>("depth").copied(),
        max_concurrent: sub_matches.get_one::<usize>("max-concurrent").copied(),
        timeout: sub_matches.get_one::<f64>("timeout").copied(),
        no_robots: sub_matches.get_flag("no-robots"),
        output_format: sub_matches.get_one::<String>("format").cloned(),
        output_path: sub_matches.get_one::<String>("output").cloned(),
    };

    let base_config = match sub_matches.get_one::<std::path::PathBuf>("config") {
        Some(path) => match Config::from_yaml(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("x Failed to load config: {:#}", e);
                std::process::exit(1);
            }
        },
        None => Config::default(),
    };
    let config = base_config.merge_with_args(&overrides);

    let db_arg = sub_matches.get_one::<String>("db").unwrap();
    let db_path = handlers::resolve_db_path(db_arg);

    if let Err(e) = handlers::run_crawl(&config, &db_path, quiet).await {
        eprintln!("x Crawl failed: {:#}", e);
        std::process::exit(1);
    }
}

fn handle_report(sub_matches: &ArgMatches) {
    let db_arg = sub_matches.get_one::<String>("db").unwrap();
    let db_path = handlers::resolve_db_path(db_arg);

    let db = match Database::new(&db_path) {
        Ok(db) => db,
        Err(e) => {
            eprintln!("x Failed to open database at {}: {}", db_path.display(), e);
            std::process::exit(1);
        }
    };

    let requested = sub_matches.get_one::<String>("CRAWL_ID").map(String::as_str);
    let crawl_id = match handlers::resolve_crawl_id(&db, requested) {
        Ok(id) => id,
        Err(e) => {
            eprintln!("x {:#}", e);
            std::process::exit(1);
        }
    };

    let format = sub_matches.get_one::<String>("format").unwrap();
    let output = sub_matches.get_one::<String>("output").map(String::as_str);

    if let Err(e) = handlers::render_report(&db, &crawl_id, format, output) {
        eprintln!("x Report failed: {:#}", e);
        std::process::exit(1);
    }
}

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);
