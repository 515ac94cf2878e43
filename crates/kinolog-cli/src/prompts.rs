use async_trait::async_trait;
use color_eyre::Result;
use dialoguer::{Confirm, Input, Select};
use rating_sync_core::ConfirmDelete;
use std::io::IsTerminal;

pub fn is_interactive() -> bool {
    std::io::stdout().is_terminal() && std::io::stderr().is_terminal()
}

/// Prompt for a string value with optional default
pub fn prompt_string(prompt: &str, default: Option<&str>, allow_empty: bool) -> Result<String> {
    let mut input_builder = Input::<String>::new()
        .with_prompt(prompt)
        .allow_empty(allow_empty);

    if let Some(default_value) = default {
        input_builder = input_builder.default(default_value.to_string());
    }

    input_builder
        .interact_text()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to read input: {}", e))
}

/// Prompt for a choice among the given items, returning the selected index
pub fn prompt_select(prompt: &str, items: &[String]) -> Result<usize> {
    Select::new()
        .with_prompt(prompt)
        .items(items)
        .default(0)
        .interact()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to read selection: {}", e))
}

/// Prompt for yes/no with a default
pub fn prompt_confirm(prompt: &str, default: bool) -> Result<bool> {
    Confirm::new()
        .with_prompt(prompt)
        .default(default)
        .interact()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to read confirmation: {}", e))
}

/// Terminal confirmation dialog for destructive actions. The session's
/// dialog gate guarantees only one of these is active at a time.
pub struct CliConfirm;

#[async_trait]
impl ConfirmDelete for CliConfirm {
    async fn confirm(&self, message: &str) -> anyhow::Result<bool> {
        if !is_interactive() {
            // No terminal to ask on; refuse rather than guess.
            return Ok(false);
        }
        Confirm::new()
            .with_prompt(message)
            .default(false)
            .interact()
            .map_err(|e| anyhow::anyhow!("Failed to read confirmation: {}", e))
    }
}
