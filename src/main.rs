use clap::Parser;
use notevault::cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let result = match cli.command {
        Commands::Init => notevault::cli::commands::init::execute(&cli),
        Commands::Add {
            ref title,
            ref fields,
        } => notevault::cli::commands::add::execute(&cli, title, fields.clone()),
        Commands::Edit {
            ref id,
            ref title,
            ref fields,
        } => notevault::cli::commands::edit::execute(&cli, id, title.as_deref(), fields.clone()),
        Commands::List { ref query } => {
            notevault::cli::commands::list::execute(&cli, query.as_deref())
        }
        Commands::Show { ref id, reveal } => {
            notevault::cli::commands::show::execute(&cli, id, reveal)
        }
        Commands::Delete { ref id, force } => {
            notevault::cli::commands::delete::execute(&cli, id, force)
        }
        Commands::Sync { ref action } => notevault::cli::commands::sync::execute(&cli, action),
    };

    if let Err(e) = result {
        notevault::cli::output::error(&e.to_string());
        std::process::exit(1);
    }
}

/// Diagnostics go to stderr, filtered by `NOTEVAULT_LOG` (default: warn).
fn init_tracing() {
    let filter = EnvFilter::try_from_env("NOTEVAULT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
