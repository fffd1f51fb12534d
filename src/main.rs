use clap::Parser;
use nyc311_weather::cli::{args::Args, commands};
use std::process;

fn main() {
    let args = Args::parse();

    // If no subcommand was provided, show help and available commands
    if args.command.is_none() {
        show_help_and_commands();
        process::exit(0);
    }

    match commands::run(args) {
        Ok(()) => process::exit(0),
        Err(error) => {
            eprintln!("Error: {:#}", error);
            process::exit(1);
        }
    }
}

/// Show help information and available commands when no subcommand is provided
fn show_help_and_commands() {
    println!("nyc311-weather - NYC 311 noise complaints x NOAA ISD hourly weather");
    println!("===================================================================");
    println!();
    println!("Joins 311 complaints to station weather on a time-zone-correct local hour");
    println!("and refuses to write a canonical table unless every check passes.");
    println!();
    println!("USAGE:");
    println!("    nyc311-weather <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("    weather     Raw ISD weather -> hourly weather table");
    println!("    join        Complaints + hourly table -> joined and canonical tables");
    println!("    run         Weather and join stages in one invocation");
    println!("    report      Day-part by temperature series from the canonical table");
    println!("    inspect     Check both inputs line up in time, write nothing");
    println!("    help        Show this help message or help for specific commands");
    println!();
    println!("OPTIONS:");
    println!("    -c, --config <FILE>  Configuration file (TOML)");
    println!("    -v, --verbose        Increase logging verbosity");
    println!("    -q, --quiet          Only show errors");
    println!("    -h, --help           Show help information");
    println!("    -V, --version        Show version information");
    println!();
    println!("EXAMPLES:");
    println!("    # Full pipeline with the default data/ layout:");
    println!("    nyc311-weather run");
    println!();
    println!("    # Complaints exported in UTC, pick one station from a multi-station file:");
    println!("    nyc311-weather run --complaint-zone utc --station 74486094789");
    println!();
    println!("    # Report with 5 °C bins as JSON:");
    println!("    nyc311-weather report --bin-width 5 --format json");
    println!();
    println!("For detailed help on any command, use:");
    println!("    nyc311-weather <COMMAND> --help");
}
