use crate::output::{Output, OutputFormat};
use crate::prompts;
use crate::ConfigCommands;
use color_eyre::Result;
use rating_sync_config::{Config, LocalConfig, PathManager, RemoteConfig, StoreBackend};

/// Load the configuration, falling back to the local-backend defaults when
/// no file exists yet.
pub fn load_or_default(output: &Output) -> Result<Config> {
    let path_manager = PathManager::default();
    let config_file = path_manager.config_file();

    if !config_file.exists() {
        output.info("No configuration file found; using the local backend defaults. Run 'kinolog config init' to set one up.");
        return Ok(Config::default());
    }

    let config = Config::load_from_file(&config_file).map_err(|e| {
        color_eyre::eyre::eyre!("Failed to load config from {}: {}", config_file.display(), e)
    })?;
    config
        .validate()
        .map_err(|e| color_eyre::eyre::eyre!("Invalid configuration: {}", e))?;
    Ok(config)
}

pub async fn run_config(cmd: ConfigCommands, output: &Output) -> Result<()> {
    match cmd {
        ConfigCommands::Show { full } => run_show(full, output),
        ConfigCommands::Init => run_init(output),
    }
}

fn run_show(full: bool, output: &Output) -> Result<()> {
    let mut config = load_or_default(output)?;

    if !full {
        if let Some(remote) = config.remote.as_mut() {
            remote.api_key = "********".to_string();
        }
    }

    match output.format() {
        OutputFormat::Human => {
            let rendered = toml::to_string_pretty(&config)
                .map_err(|e| color_eyre::eyre::eyre!("Failed to render config: {}", e))?;
            output.println(rendered);
        }
        OutputFormat::Json | OutputFormat::JsonPretty => {
            let value = serde_json::to_value(&config)
                .map_err(|e| color_eyre::eyre::eyre!("Failed to render config: {}", e))?;
            output.json(&value);
        }
    }
    Ok(())
}

fn run_init(output: &Output) -> Result<()> {
    if !prompts::is_interactive() {
        return Err(color_eyre::eyre::eyre!(
            "'config init' needs an interactive terminal"
        ));
    }

    let backends = vec!["local".to_string(), "remote".to_string()];
    let backend = match prompts::prompt_select("Record store backend", &backends)? {
        1 => StoreBackend::Remote,
        _ => StoreBackend::Local,
    };

    let remote = if backend == StoreBackend::Remote {
        let url = prompts::prompt_string("REST base URL (e.g. https://xyz.supabase.co/rest/v1)", None, false)?;
        let api_key = prompts::prompt_string("API key", None, false)?;
        let table = prompts::prompt_string("Table name", Some("movies"), false)?;
        let poll = prompts::prompt_string("Change-feed poll interval in seconds", Some("5"), false)?;
        let poll_interval_secs = poll
            .trim()
            .parse::<u64>()
            .map_err(|e| color_eyre::eyre::eyre!("Invalid poll interval: {}", e))?;
        Some(RemoteConfig {
            url,
            api_key,
            table,
            poll_interval_secs,
        })
    } else {
        None
    };

    let defaults = Config::default();
    let contributor_default = defaults.contributors.join(", ");
    let contributors_raw = prompts::prompt_string(
        "Contributors (comma separated)",
        Some(&contributor_default),
        false,
    )?;
    let contributors: Vec<String> = contributors_raw
        .split(',')
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();

    let config = Config {
        backend,
        remote,
        local: Some(LocalConfig { path: None }),
        contributors,
    };
    config
        .validate()
        .map_err(|e| color_eyre::eyre::eyre!("Invalid configuration: {}", e))?;

    let path_manager = PathManager::default();
    path_manager
        .ensure_directories()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to create config directories: {}", e))?;
    let config_file = path_manager.config_file();
    config
        .save_to_file(&config_file)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to save config: {}", e))?;

    output.success(format!("Configuration written to {}", config_file.display()));
    Ok(())
}
