use clap::{arg, command};

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("gleaner")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("gleaner")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .subcommand_required(false)
        .subcommand(
            command!("extract")
                .about(
                    "Runs an extraction request against its target site and renders the \
                collected records.",
                )
                .arg(
                    arg!(-r --"request" <PATH>)
                        .required(true)
                        .help("Path to the JSON extraction request file")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save the rendered report to a file (default: print to stdout)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json, csv, tsv")
                        .value_parser(["text", "json", "csv", "tsv"])
                        .default_value("text"),
                )
                .arg(
                    arg!(-t --"timeout" <SECONDS>)
                        .required(false)
                        .help("Per-page request timeout in seconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("10"),
                )
                .arg(
                    arg!(--"no-progress")
                        .required(false)
                        .help("Disable the progress spinner")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
        .subcommand(
            command!("validate")
                .about("Checks an extraction request file for schema errors without fetching anything.")
                .arg(
                    arg!(-r --"request" <PATH>)
                        .required(true)
                        .help("Path to the JSON extraction request file")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                ),
        )
}
