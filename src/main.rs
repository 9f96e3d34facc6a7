//! quotesync CLI entry point.

use clap::Parser;
use qsync::cli::commands::{self, Context};
use qsync::cli::{Cli, Commands};
use qsync::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    // Set up tracing based on verbosity
    init_tracing(cli.verbose, cli.quiet);

    // Resolve effective JSON mode: --json OR non-TTY stdout
    let json = cli.json || !std::io::IsTerminal::is_terminal(&std::io::stdout());

    // Run the command and handle errors
    match run(&cli, json) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if json {
                eprintln!("{}", e.to_structured_json());
            } else if !cli.quiet {
                if let Some(hint) = e.hint() {
                    eprintln!("Error: {e}\n  Hint: {hint}");
                } else {
                    eprintln!("Error: {e}");
                }
            }
            ExitCode::from(e.exit_code())
        }
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    if quiet {
        return;
    }

    // Honor RUST_LOG if set, otherwise use verbosity flag
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        match verbose {
            0 => EnvFilter::new("warn,qsync::status=info"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug,reqwest=info,hyper=info"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn run(cli: &Cli, json: bool) -> Result<(), Error> {
    // Completions need no configuration
    let ctx = match &cli.command {
        Commands::Completions { shell } => return commands::completions::execute(shell),
        _ => Context::from_cli(cli, json)?,
    };

    match &cli.command {
        Commands::Add { text, category } => commands::records::add(&ctx, text, category),
        Commands::Import { file } => commands::records::import(&ctx, file),
        Commands::Export { output } => commands::records::export(&ctx, output.as_deref()),
        Commands::List(filter) => commands::records::list(&ctx, filter),
        Commands::Random(filter) => commands::records::random(&ctx, filter),
        Commands::Categories => commands::records::categories(&ctx),

        // Sync
        Commands::Sync => commands::sync::execute(&ctx),
        Commands::Watch { interval } => commands::sync::watch(&ctx, *interval),

        Commands::Status => commands::status::execute(&ctx),
        Commands::Config { command } => commands::config::execute(&ctx, command.as_ref()),

        Commands::Completions { shell } => commands::completions::execute(shell),
    }
}
