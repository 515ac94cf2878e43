use crate::commands::config;
use crate::output::{Output, OutputFormat};
use crate::prompts;
use color_eyre::Result;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use indicatif::{ProgressBar, ProgressStyle};
use rating_sync_core::{
    FilterState, NameFilter, RatingFilter, Timeline, TimelineSession, NO_MATCHES_PLACEHOLDER,
};
use rating_sync_store::create_store;
use std::time::Duration;

pub async fn run_timeline(
    name: Option<String>,
    rating: Option<u8>,
    follow: bool,
    output: &Output,
) -> Result<()> {
    let config = config::load_or_default(output)?;
    let store = create_store(&config)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to create record store: {}", e))?;

    let filters = FilterState {
        name: name.map(|n| NameFilter::parse(&n)).unwrap_or_default(),
        rating: rating.map(RatingFilter::Exactly).unwrap_or_default(),
    };
    let mut session =
        TimelineSession::new(store, Box::new(prompts::CliConfirm)).with_filters(filters);

    start_with_retry(&mut session, output).await?;
    print_timeline(&session.render(), output);

    if follow {
        if !session.has_change_feed() {
            output.warn("The local backend has no change feed; nothing to follow.");
            return Ok(());
        }
        output.info("Following changes (Ctrl-C to stop)...");
        loop {
            session.next_invalidation().await;
            match session.refresh().await {
                Ok(true) => print_timeline(&session.render(), output),
                // A newer fetch already won; its state is on screen.
                Ok(false) => tracing::debug!("Stale fetch snapshot discarded"),
                Err(e) => output.error(format!("Error loading movies: {}", e)),
            }
        }
    }

    Ok(())
}

/// Initial connect + fetch with the persistent-error affordance: on
/// failure the banner stays up and the user chooses to retry or bail.
async fn start_with_retry(session: &mut TimelineSession, output: &Output) -> Result<()> {
    loop {
        let spinner = fetch_spinner(output);
        let result = session.start().await;
        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
        }

        match result {
            Ok(()) => return Ok(()),
            Err(e) => {
                if e.is_unavailable() {
                    output.error(format!(
                        "Connection error: {}. Check the configuration and your network.",
                        e
                    ));
                } else {
                    output.error(format!("Error loading movies: {}", e));
                }
                if prompts::is_interactive() && prompts::prompt_confirm("Try again?", true)? {
                    continue;
                }
                return Err(color_eyre::eyre::eyre!("could not load the timeline: {}", e));
            }
        }
    }
}

fn fetch_spinner(output: &Output) -> Option<ProgressBar> {
    if output.format() != OutputFormat::Human || output.is_quiet() || !prompts::is_interactive() {
        return None;
    }
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message("Fetching ratings...");
    Some(spinner)
}

fn print_timeline(timeline: &Timeline, output: &Output) {
    match output.format() {
        OutputFormat::Human => match timeline {
            Timeline::NoMatches => output.println(NO_MATCHES_PLACEHOLDER),
            Timeline::Entries(entries) => {
                let mut table = Table::new();
                table
                    .load_preset(UTF8_FULL)
                    .set_content_arrangement(ContentArrangement::Dynamic)
                    .set_header(vec!["Movie", "Rating", "Review", "Rated by", "When", "Id"]);
                for entry in entries {
                    table.add_row(vec![
                        entry.title.clone(),
                        entry.stars.clone(),
                        entry.review.clone().unwrap_or_default(),
                        entry.name.clone(),
                        entry.date.clone(),
                        entry.id.clone().unwrap_or_else(|| "-".to_string()),
                    ]);
                }
                output.println(table.to_string());
            }
        },
        OutputFormat::Json | OutputFormat::JsonPretty => match serde_json::to_value(timeline) {
            Ok(value) => output.json(&value),
            Err(e) => output.error(format!("Failed to render timeline: {}", e)),
        },
    }
}
