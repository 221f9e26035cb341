use crate::CLAP_STYLING;
use clap::{arg, command};
use url::Url;

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("sitehealth")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("sitehealth")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .subcommand_required(false)
        .subcommand(
            command!("init")
                .about("Initializes the sitehealth database on your filesystem")
                .arg(
                    arg!([PATH])
                        .required(false)
                        .help("Location to store the sitehealth database")
                        .default_value("~/.config/sitehealth/"),
                )
                .arg(
                    arg!(-f - -"force")
                        .help(
                            "Forces the overwriting of any existing database at the specified \
                        location.",
                        )
                        .required(false),
                ),
        )
        .subcommand(
            command!("crawl")
                .about("Crawl a website breadth-first and check every discovered link")
                .arg(
                    arg!([URL])
                        .required(false)
                        .help("The URL to start crawling from")
                        .value_parser(clap::value_parser!(Url)),
                )
                .arg(
                    arg!(-d --"depth" <DEPTH>)
                        .required(false)
                        .help("Maximum crawl depth")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--"max-concurrent" <NUM>)
                        .required(false)
                        .help("Maximum number of HTTP requests in flight at once")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Per-request timeout in seconds")
                        .value_parser(clap::value_parser!(f64)),
                )
                .arg(
                    arg!(--"no-robots")
                        .required(false)
                        .help("Ignore robots.txt")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(-c --"config" <PATH>)
                        .required(false)
                        .help("YAML config file; command-line flags take precedence")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: terminal, json, html")
                        .value_parser(["terminal", "json", "html"]),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save report to file (default: display to screen)"),
                )
                .arg(
                    arg!(--"db" <PATH>)
                        .required(false)
                        .help("Database path")
                        .default_value("sitehealth.db"),
                ),
        )
        .subcommand(
            command!("report")
                .about("Re-render the report for a stored crawl")
                .arg(
                    arg!([CRAWL_ID])
                        .required(false)
                        .help("Crawl to render (defaults to the most recent)"),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: terminal, json, html")
                        .value_parser(["terminal", "json", "html"])
                        .default_value("terminal"),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save report to file (default: display to screen)"),
                )
                .arg(
                    arg!(--"db" <PATH>)
                        .required(false)
                        .help("Database path")
                        .default_value("sitehealth.db"),
                ),
        )
}
