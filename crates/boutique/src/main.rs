mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use boutique_core::Controller;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands don't open a store session
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "boutique", &mut std::io::stdout());
            Ok(())
        }

        cmd => {
            let session = config::resolve_session(&cli.global, matches!(cmd, Command::Watch))?;
            let controller = Controller::new(session.config);
            let mode = controller.start(session.identity).await?;
            tracing::debug!(?mode, command = ?cmd, "dispatching command");

            let result = commands::dispatch(cmd, &controller, &cli.global).await;

            if let Err(e) = commands::reconcile::record(&controller) {
                tracing::warn!(error = %e, "failed to record reconciliation issues");
            }
            controller.shutdown().await;
            result
        }
    }
}
