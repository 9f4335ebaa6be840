//! Live change feed.

use tokio::sync::broadcast::error::RecvError;

use boutique_core::{Controller, SessionState};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

pub async fn handle(controller: &Controller, global: &GlobalOpts) -> Result<(), CliError> {
    let mode = *controller.session_state().borrow();
    if mode != SessionState::Remote {
        output::warn(
            global,
            "not signed in to a remote store; there is no change feed to watch",
        );
        return Ok(());
    }

    let mut changes = controller.changes();
    output::success(global, "Watching for changes (Ctrl-C to stop)");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = changes.recv() => match event {
                Ok(event) => {
                    let line = match global.output {
                        OutputFormat::Json | OutputFormat::JsonCompact => {
                            serde_json::to_string(&*event)?
                        }
                        _ => format!(
                            "{} {:<6} {:<12} {}",
                            chrono::Local::now().format("%H:%M:%S"),
                            event.kind,
                            event.table,
                            event.record_id.as_deref().unwrap_or("-"),
                        ),
                    };
                    output::print_output(&line, global.quiet);
                }
                Err(RecvError::Lagged(skipped)) => {
                    output::warn(global, &format!("missed {skipped} changes"));
                }
                Err(RecvError::Closed) => break,
            },
        }
    }
    Ok(())
}
