use clap::{ArgAction, Parser, Subcommand};
use commands::{add, config, delete, timeline};

mod commands;
mod logging;
mod output;
mod prompts;

#[derive(Parser)]
#[command(name = "kinolog")]
#[command(about = "Kinolog - the family movie-rating timeline")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the rating timeline
    #[command(long_about = "Fetch every rating from the configured record store and display it newest-first. Filters narrow the view without touching the stored data. With --follow the session stays subscribed to change notifications and re-renders whenever the collection changes.")]
    Timeline {
        /// Only show entries rated by this contributor
        #[arg(long, value_name = "WHO")]
        name: Option<String>,

        /// Only show entries with exactly this star rating
        #[arg(long, value_name = "STARS", value_parser = clap::value_parser!(u8).range(1..=5))]
        rating: Option<u8>,

        /// Keep running and re-render on every change notification
        #[arg(long, action = ArgAction::SetTrue)]
        follow: bool,
    },

    /// Add a rating entry
    #[command(long_about = "Submit a new rating. Fields not given as flags are gathered interactively: the contributor is picked from the configured family set (or OTHERS with a free-text name), then title, stars and an optional review. All validation problems are reported together.")]
    Add {
        /// Contributor, one of the configured names or OTHERS
        #[arg(long, value_name = "WHO")]
        name: Option<String>,

        /// Free-text name used when --name is OTHERS
        #[arg(long, value_name = "WHO")]
        other_name: Option<String>,

        /// Movie title
        #[arg(long, value_name = "TITLE")]
        title: Option<String>,

        /// Star rating, 1-5
        #[arg(long, value_name = "STARS")]
        rating: Option<String>,

        /// Optional review text
        #[arg(long, value_name = "TEXT")]
        review: Option<String>,
    },

    /// Delete a rating entry
    #[command(long_about = "Delete the entry with the given id (shown in the timeline) after an explicit confirmation. Use --yes to skip the prompt in scripts.")]
    Delete {
        /// Id of the entry to delete
        id: String,

        /// Skip the confirmation prompt
        #[arg(long, action = ArgAction::SetTrue)]
        yes: bool,
    },

    /// Inspect or create the configuration
    #[command(long_about = "Manage the kinolog configuration file. 'show' prints the active configuration with the api key masked; 'init' runs an interactive setup. Running without a subcommand defaults to 'show'.")]
    Config {
        #[command(subcommand)]
        cmd: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration (masks sensitive data)
    Show {
        /// Show full configuration including masked secrets
        #[arg(long, action = ArgAction::SetTrue)]
        full: bool,
    },

    /// Interactively create the configuration file
    Init,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    logging::init_logging(cli.verbose, cli.quiet)
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    match cli.command {
        Commands::Timeline { name, rating, follow } => {
            timeline::run_timeline(name, rating, follow, &output).await
        }
        Commands::Add {
            name,
            other_name,
            title,
            rating,
            review,
        } => add::run_add(name, other_name, title, rating, review, &output).await,
        Commands::Delete { id, yes } => delete::run_delete(&id, yes, &output).await,
        Commands::Config { cmd } => {
            let cmd = cmd.unwrap_or(ConfigCommands::Show { full: false });
            config::run_config(cmd, &output).await
        }
    }
}
