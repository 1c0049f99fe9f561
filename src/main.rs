use std::path::PathBuf;

use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use smartlists::{
    cli::{self, PullTarget},
    config::{self, Settings},
    error,
    playlist::UnresolvedPolicy,
};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  author=env!("CARGO_PKG_AUTHORS"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    /// SQLite database holding the library mirror and root playlists
    #[clap(long, global = true)]
    database: Option<PathBuf>,

    /// Directory with playlist definitions (*.yaml, *.yml, *.toml, *.json)
    #[clap(long, global = true)]
    playlists: Option<PathBuf>,

    /// Number of tracks in each synced playlist (more than 5)
    #[clap(long, global = true, value_parser = parse_target_size)]
    target_size: Option<usize>,

    /// What to do with pinned tracks missing from the library
    #[clap(long, global = true, value_enum)]
    unresolved: Option<UnresolvedPolicy>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Authorize with Spotify API
    Auth(AuthOptions),

    /// Mirror library, play history and metadata from Spotify
    Pull(PullOptions),

    /// Compile playlist definitions into root playlists
    Build,

    /// Select tracks for every root playlist and sync them to Spotify
    Load,

    /// Pull, build and load in one run
    Update,

    /// Show stored root playlists
    Playlists,

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct AuthOptions {
    /// Print a new credential cache key and exit
    #[clap(long)]
    pub generate_key: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct PullOptions {
    #[clap(value_enum, default_value = "all")]
    pub target: PullTarget,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

fn parse_target_size(value: &str) -> Result<usize, String> {
    config::parse_target_size(value).map_err(|e| e.to_string())
}

fn settings(cli: &Cli) -> Settings {
    let mut settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => error!("Invalid configuration: {}", e),
    };

    if let Some(database) = &cli.database {
        settings.database = database.clone();
    }
    if let Some(playlists) = &cli.playlists {
        settings.playlists_dir = playlists.clone();
    }
    if let Some(target_size) = cli.target_size {
        settings.target_size = target_size;
    }
    if let Some(unresolved) = cli.unresolved {
        settings.unresolved = unresolved;
    }

    settings
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }

    let cli = Cli::parse();

    match &cli.command {
        Command::Auth(opt) if opt.generate_key => cli::print_new_key(),
        Command::Auth(_) => cli::auth(&settings(&cli)).await,
        Command::Pull(opt) => cli::pull(&settings(&cli), opt.target).await,
        Command::Build => cli::build(&settings(&cli)).await,
        Command::Load => cli::load(&settings(&cli)).await,
        Command::Update => cli::update(&settings(&cli)).await,
        Command::Playlists => cli::playlists(&settings(&cli)).await,
        Command::Completions(opt) => {
            let mut cmd = Cli::command_for_update();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
    }
}
