//! CLI command implementations

use cinescope_catalog::{ImageSize, MediaIdentity, MediaType};
use cinescope_core::discovery::{catalog_from_config, storage_from_config};
use cinescope_core::{
    CinescopeConfig, CinescopeError, DetailState, Discovery, Resolution, Result, TypeFilter,
};
use clap::Subcommand;

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Search movies and series
    Search {
        /// Search term
        term: String,
        /// Results page
        #[arg(short, long, default_value = "1")]
        page: u32,
        /// Only show one media type
        #[arg(short = 't', long = "type", value_enum, default_value_t = TypeFilter::All)]
        type_filter: TypeFilter,
    },
    /// Show details and recommendations of a title
    Details {
        /// Catalog id
        id: u64,
        /// movie or series
        #[arg(short = 't', long = "type", default_value = "movie")]
        media_type: MediaType,
    },
    /// List the episodes of a series season
    Episodes {
        /// Catalog id of the series
        id: u64,
        /// Season number, defaults to the first listed season
        #[arg(short, long)]
        season: Option<u32>,
    },
    /// Print playback URLs for a title
    Play {
        /// Catalog id
        id: u64,
        /// movie or series
        #[arg(short = 't', long = "type", default_value = "movie")]
        media_type: MediaType,
        /// Season number for series
        #[arg(short, long)]
        season: Option<u32>,
        /// Episode number for series
        #[arg(short, long)]
        episode: Option<u32>,
    },
    /// Manage the watchlist
    Watchlist {
        #[command(subcommand)]
        action: WatchlistAction,
    },
}

/// Watchlist operations
#[derive(Subcommand)]
pub enum WatchlistAction {
    /// List saved titles
    List,
    /// Save a title
    Add {
        id: u64,
        #[arg(short = 't', long = "type", default_value = "movie")]
        media_type: MediaType,
    },
    /// Remove a saved title
    Remove {
        id: u64,
        #[arg(short = 't', long = "type", default_value = "movie")]
        media_type: MediaType,
    },
    /// Check whether any title with this id is saved
    Contains { id: u64 },
}

/// Handle the CLI command
///
/// # Errors
/// Returns the error of the subsystem the command failed in
pub async fn handle_command(
    command: Commands,
    config: CinescopeConfig,
    demo: bool,
) -> Result<()> {
    let catalog = catalog_from_config(&config.catalog, demo)?;
    let storage = storage_from_config(&config.storage);
    let mut session = Discovery::init(config, catalog, storage).await?;

    match command {
        Commands::Search {
            term,
            page,
            type_filter,
        } => search(&session, &term, page, type_filter).await?,
        Commands::Details { id, media_type } => {
            show_details(&session, MediaIdentity { id, media_type }).await?
        }
        Commands::Episodes { id, season } => list_episodes(&session, id, season).await?,
        Commands::Play {
            id,
            media_type,
            season,
            episode,
        } => play(&session, MediaIdentity { id, media_type }, season, episode),
        Commands::Watchlist { action } => watchlist(&mut session, action).await?,
    }

    session.shutdown().await
}

/// Search the catalog and print one page of results
///
/// # Errors
/// - `CinescopeError::Catalog` - The provider request failed
async fn search(
    session: &Discovery,
    term: &str,
    page: u32,
    type_filter: TypeFilter,
) -> Result<()> {
    let resolution = session.search().query(term, page, type_filter).await;
    let Resolution::Current(outcome) = resolution else {
        return Ok(());
    };
    if let Some(error) = outcome.error {
        return Err(error.into());
    }

    let results = outcome.results;
    println!(
        "Results for \"{term}\" ({type_filter}) - page {} of {}, {} total",
        results.page,
        results.total_pages.max(1),
        results.total_results
    );
    println!("{:-<60}", "");

    if results.items.is_empty() {
        println!("No results found.");
        return Ok(());
    }

    for item in &results.items {
        let saved = if session.watchlist().contains(item.identity.id) {
            " [saved]"
        } else {
            ""
        };
        println!(
            "{:>8}  {:<6}  {} ({}){}",
            item.identity.id,
            item.identity.media_type.to_string(),
            item.title,
            item.display_year(),
            saved
        );
    }

    Ok(())
}

/// Print a title's details and recommendations
///
/// # Errors
/// - `CinescopeError::Catalog` - Details or recommendations failed to load
async fn show_details(session: &Discovery, identity: MediaIdentity) -> Result<()> {
    let (detail, recommendations) = match session.open_details(identity).await {
        Resolution::Current(DetailState::Ready {
            detail,
            recommendations,
        }) => (detail, recommendations),
        Resolution::Current(DetailState::Failed { error }) => return Err(error.source.into()),
        _ => return Ok(()),
    };

    let summary = &detail.summary;
    println!("{} ({})", summary.title, summary.display_year());
    if let Some(tagline) = &detail.tagline {
        println!("  \"{tagline}\"");
    }
    println!("{:-<60}", "");

    if let Some(rating) = summary.rating_label() {
        println!("Rating:   {rating}");
    }
    if let Some(runtime) = detail.runtime_label() {
        println!("Runtime:  {runtime}");
    }
    if !detail.genres.is_empty() {
        println!("Genres:   {}", detail.genre_names());
    }
    if let Some(image) = session.image_url(summary.hero_image(), ImageSize::Original) {
        println!("Image:    {image}");
    }
    if let Some(trailer) = detail.primary_trailer().and_then(|t| t.youtube_url()) {
        println!("Trailer:  {trailer}");
    }
    println!(
        "Saved:    {}",
        if session.watchlist().contains_identity(identity) {
            "yes"
        } else {
            "no"
        }
    );

    if let Some(overview) = &summary.overview {
        println!("\n{overview}");
    }

    if !detail.cast.is_empty() {
        println!("\nCast:");
        for member in detail.cast.iter().take(10) {
            match &member.character {
                Some(character) => println!("  {} as {character}", member.name),
                None => println!("  {}", member.name),
            }
        }
    }

    if !detail.seasons.is_empty() {
        println!("\nSeasons:");
        for season in &detail.seasons {
            println!(
                "  {:>3}  {} ({} episodes)",
                season.season_number,
                season.label(),
                season.episode_count
            );
        }
    }

    if !recommendations.is_empty() {
        println!("\nYou might also like:");
        for item in recommendations.iter().take(10) {
            println!(
                "  {:>8}  {} ({})",
                item.identity.id,
                item.title,
                item.display_year()
            );
        }
    }

    Ok(())
}

/// Print the episodes of one season
///
/// # Errors
/// - `CinescopeError::Catalog` - The series or its season failed to load
async fn list_episodes(session: &Discovery, show_id: u64, season: Option<u32>) -> Result<()> {
    let identity = MediaIdentity::series(show_id);
    let detail = match session.open_details(identity).await {
        Resolution::Current(DetailState::Ready { detail, .. }) => detail,
        Resolution::Current(DetailState::Failed { error }) => return Err(error.source.into()),
        _ => return Ok(()),
    };

    let Some(season_number) = season.or_else(|| session.episodes().selected_season()) else {
        println!("{} has no seasons.", detail.summary.title);
        return Ok(());
    };

    let listing = session.episodes().select_season(show_id, season_number).await;
    if let Some(error) = listing.error {
        return Err(CinescopeError::Catalog(error));
    }

    let label = detail
        .seasons
        .iter()
        .find(|s| s.season_number == season_number)
        .map(|s| s.label())
        .unwrap_or_else(|| format!("Season {season_number}"));
    println!("{} - {label}", detail.summary.title);
    println!("{:-<60}", "");

    for episode in listing.episodes.iter() {
        let runtime = episode
            .runtime_minutes
            .map(cinescope_catalog::format_runtime)
            .unwrap_or_default();
        println!("  {:>3}. {}  {runtime}", episode.episode_number, episode.name);
    }

    Ok(())
}

fn play(
    session: &Discovery,
    identity: MediaIdentity,
    season: Option<u32>,
    episode: Option<u32>,
) {
    println!("Playback sources for {identity}:");
    for candidate in session.play(identity, season, episode) {
        println!("  {:<10} {}", candidate.provider_name, candidate.url);
    }
}

/// Run a watchlist action
///
/// # Errors
/// - `CinescopeError::Watchlist` - The change could not be saved
/// - `CinescopeError::Catalog` - The title to add could not be looked up
async fn watchlist(session: &mut Discovery, action: WatchlistAction) -> Result<()> {
    match action {
        WatchlistAction::List => {
            let entries = session.watchlist().list();
            if entries.is_empty() {
                println!("Your watchlist is empty.");
                println!("Use 'cinescope watchlist add <id> --type <type>' to save a title.");
                return Ok(());
            }
            println!("Watchlist ({} titles)", entries.len());
            println!("{:-<60}", "");
            for entry in entries {
                println!(
                    "{:>8}  {:<6}  {} ({})  added {}",
                    entry.identity.id,
                    entry.identity.media_type.to_string(),
                    entry.summary.title,
                    entry.summary.display_year(),
                    entry.added_at.format("%Y-%m-%d")
                );
            }
        }
        WatchlistAction::Add { id, media_type } => {
            let identity = MediaIdentity { id, media_type };
            let detail = match session.open_details(identity).await {
                Resolution::Current(DetailState::Ready { detail, .. }) => detail,
                Resolution::Current(DetailState::Failed { error }) => {
                    return Err(error.source.into());
                }
                _ => return Ok(()),
            };
            session
                .watchlist_mut()
                .add(detail.summary.clone(), identity)
                .await?;
            println!("Saved {} to your watchlist.", detail.summary.title);
        }
        WatchlistAction::Remove { id, media_type } => {
            let identity = MediaIdentity { id, media_type };
            if session.watchlist_mut().remove(identity).await? {
                println!("Removed {identity} from your watchlist.");
            } else {
                println!("{identity} is not on your watchlist.");
            }
        }
        WatchlistAction::Contains { id } => {
            println!("{}", session.watchlist().contains(id));
        }
    }

    Ok(())
}
