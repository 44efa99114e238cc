use gleaner::handlers;

mod commands;

#[tokio::main]
async fn main() {
    let cmd = commands::command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");

    // Show banner unless --quiet flag is set
    if !quiet {
        gleaner_core::print_banner();
    }

    if chosen_command.subcommand().is_none() {
        // No subcommand provided, just show the banner
        return;
    }

    match chosen_command.subcommand() {
        Some(("extract", primary_command)) => handlers::handle_extract(primary_command).await,
        Some(("validate", primary_command)) => handlers::handle_validate(primary_command),
        _ => unreachable!("clap should ensure we don't get here"),
    }
}
