use crate::commands::config;
use crate::output::Output;
use crate::prompts;
use color_eyre::Result;
use rating_sync_core::{AutoConfirm, ConfirmDelete, DeleteOutcome, TimelineSession};
use rating_sync_store::create_store;

pub async fn run_delete(id: &str, yes: bool, output: &Output) -> Result<()> {
    let config = config::load_or_default(output)?;
    let store = create_store(&config)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to create record store: {}", e))?;

    let confirmer: Box<dyn ConfirmDelete> = if yes {
        Box::new(AutoConfirm(true))
    } else {
        Box::new(prompts::CliConfirm)
    };
    let mut session = TimelineSession::new(store, confirmer);
    if let Err(e) = session.start().await {
        output.error(format!("Connection error: {}", e));
        return Err(color_eyre::eyre::eyre!("could not reach the record store: {}", e));
    }

    match session.request_delete(id).await {
        Ok(DeleteOutcome::Deleted) => {
            output.success(format!("Deleted entry {}", id));
            Ok(())
        }
        Ok(DeleteOutcome::Cancelled) => {
            output.info("Deletion cancelled.");
            Ok(())
        }
        Err(e) => {
            output.error(format!("Failed to delete movie: {}", e));
            Err(color_eyre::eyre::eyre!("{}", e))
        }
    }
}
