use crate::commands::config;
use crate::output::{Output, OutputFormat};
use crate::prompts;
use color_eyre::Result;
use rating_sync_config::OTHERS_SENTINEL;
use rating_sync_core::{SessionError, SubmitForm, TimelineSession};
use rating_sync_store::create_store;

pub async fn run_add(
    name: Option<String>,
    other_name: Option<String>,
    title: Option<String>,
    rating: Option<String>,
    review: Option<String>,
    output: &Output,
) -> Result<()> {
    let config = config::load_or_default(output)?;
    let store = create_store(&config)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to create record store: {}", e))?;

    let mut session = TimelineSession::new(store, Box::new(prompts::CliConfirm));
    if let Err(e) = session.start().await {
        output.error(format!("Connection error: {}", e));
        return Err(color_eyre::eyre::eyre!("could not reach the record store: {}", e));
    }

    let interactive = prompts::is_interactive() && output.format() == OutputFormat::Human;

    // Fields not passed as flags come from the interactive form; in
    // scripts missing fields fall through empty and validation reports
    // them all together.
    let name_choice = match name {
        Some(n) => n,
        None if interactive => {
            let mut choices = config.contributors.clone();
            choices.push(OTHERS_SENTINEL.to_string());
            let selected = prompts::prompt_select("Who is rating?", &choices)?;
            choices[selected].clone()
        }
        None => String::new(),
    };

    let other_name = match other_name {
        Some(n) => n,
        None if interactive && name_choice == OTHERS_SENTINEL => {
            prompts::prompt_string("Your name", None, true)?
        }
        None => String::new(),
    };

    let movie_title = match title {
        Some(t) => t,
        None if interactive => prompts::prompt_string("Movie title", None, true)?,
        None => String::new(),
    };

    let rating = match rating {
        Some(r) => r,
        None if interactive => {
            let stars: Vec<String> = (1..=5).map(|n| n.to_string()).collect();
            let selected = prompts::prompt_select("Star rating", &stars)?;
            stars[selected].clone()
        }
        None => String::new(),
    };

    let review = match review {
        Some(r) => r,
        None if interactive => prompts::prompt_string("Review (optional)", None, true)?,
        None => String::new(),
    };

    let mut form = SubmitForm {
        name_choice,
        other_name,
        movie_title,
        rating,
        review,
    };
    let submitted_title = form.movie_title.trim().to_string();
    let submitted_name = form.effective_name().to_string();

    match session.submit(&mut form).await {
        Ok(()) => {
            output.success(format!(
                "Added \"{}\" rated by {}",
                submitted_title, submitted_name
            ));
            Ok(())
        }
        Err(SessionError::Validation(e)) => {
            output.error("Please ensure:");
            for issue in &e.issues {
                output.error(format!("  - {}", issue));
            }
            Err(color_eyre::eyre::eyre!("validation failed"))
        }
        Err(e) => {
            output.error(format!("Failed to add movie: {}. Please try again.", e));
            Err(color_eyre::eyre::eyre!("{}", e))
        }
    }
}
