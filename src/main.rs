//! `dafilms` CLI - browse the DAFilms catalog and resolve film streams

mod cmd;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use dafilms::{DafilmsError, FilmService, Settings, SiteClient};

use cmd::output::Output;

#[derive(Parser)]
#[command(name = "dafilms")]
#[command(about = "DAFilms catalog browser and stream resolver")]
#[command(version)]
struct Cli {
    /// Settings file (default: platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List films from the catalog
    List {
        /// Which listing to show
        #[arg(value_enum)]
        kind: ListKind,

        /// Maximum number of films
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Search the catalog
    Search {
        /// Search text
        query: String,

        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show film details
    Details {
        /// Film id (e.g. 10523-to-se-mi-snad-zda)
        film_id: String,
    },

    /// Resolve stream candidates for a film or a saved player page
    Resolve {
        /// Film id
        #[arg(required_unless_present = "file", conflicts_with = "file")]
        film_id: Option<String>,

        /// Resolve a saved HTML or player JSON file instead (no network)
        #[arg(long)]
        file: Option<PathBuf>,

        /// URL the saved page was served from, for relative links
        #[arg(long, requires = "file")]
        base_url: Option<String>,
    },

    /// Resolve and select the stream to play
    Play {
        /// Film id
        film_id: String,

        /// Title shown by the player
        #[arg(long)]
        title: Option<String>,

        /// Engine without adaptive streaming: direct files only
        #[arg(long)]
        direct_only: bool,
    },

    /// Log in with the configured credentials
    Login,
}

#[derive(Clone, Copy, ValueEnum)]
enum ListKind {
    Newest,
    Oldest,
    Title,
    All,
    Subscription,
    Purchased,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("dafilms=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<DafilmsError>() {
                Some(e) => {
                    tracing::debug!(error = %e, "Command failed");
                    eprintln!("❌ {}", e.user_message());
                }
                None => eprintln!("❌ {err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let settings = Settings::load(cli.config.as_deref())?;
    let out = Output::new(cli.json);

    if let Commands::Resolve {
        file: Some(path),
        base_url,
        ..
    } = &cli.command
    {
        return cmd::stream::cmd_resolve_file(path, base_url.as_deref(), out);
    }

    let client = SiteClient::new(&settings)?;
    let mut service = FilmService::new(client, settings);

    match cli.command {
        Commands::List { kind, limit } => {
            cmd::catalog::cmd_list(&mut service, kind.into(), limit, out).await?;
        }
        Commands::Search { query, limit } => {
            cmd::catalog::cmd_search(&mut service, &query, limit, out).await?;
        }
        Commands::Details { film_id } => {
            cmd::catalog::cmd_details(&mut service, &film_id, out).await?;
        }
        Commands::Resolve { film_id, .. } => {
            let film_id = film_id.unwrap_or_default();
            cmd::stream::cmd_resolve(&mut service, &film_id, out).await?;
        }
        Commands::Play {
            film_id,
            title,
            direct_only,
        } => {
            cmd::stream::cmd_play(&mut service, &film_id, title.as_deref(), direct_only, out).await?;
        }
        Commands::Login => {
            cmd::login::cmd_login(&mut service).await?;
        }
    }

    Ok(())
}

impl From<ListKind> for cmd::catalog::Listing {
    fn from(kind: ListKind) -> Self {
        use cmd::catalog::Listing;
        use dafilms::ListingSort;
        match kind {
            ListKind::Newest => Listing::Sorted(ListingSort::Newest),
            ListKind::Oldest => Listing::Sorted(ListingSort::Oldest),
            ListKind::Title => Listing::Sorted(ListingSort::Title { ascending: true }),
            ListKind::All => Listing::Sorted(ListingSort::All),
            ListKind::Subscription => Listing::Subscription,
            ListKind::Purchased => Listing::Purchased,
        }
    }
}
