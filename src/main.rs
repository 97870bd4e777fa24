//! punkr: browse the Punk API beer catalog from the terminal

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};

use punkr::app::Services;
use punkr::catalog::{Beer, BeerId};
use punkr::channel::Subscription;
use punkr::config::Config;
use punkr::logging::init_tracing;
use punkr::report::ErrorNotice;
use punkr::session::{
    BrowserEvent, BrowserIntent, BrowserRequest, DetailIntent, DetailParams, DetailRequest,
    FavoritesIntent, FavoritesRequest, FavoritesSessionEvent, RandomEvent, RandomIntent,
    RandomRequest,
};

#[derive(Parser, Debug)]
#[command(name = "punkr")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: ~/.config/punkr/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List beers, optionally filtered by name
    Browse {
        /// Name to search for
        #[arg(short, long)]
        search: Option<String>,

        /// Number of pages to load
        #[arg(short, long, default_value = "1")]
        pages: u32,
    },
    /// Show random beers
    Random {
        #[arg(short, long, default_value = "1")]
        count: u32,
    },
    /// Manage favorite beers
    Favorites {
        #[command(subcommand)]
        action: FavoritesAction,
    },
}

#[derive(Subcommand, Debug)]
enum FavoritesAction {
    /// List favorite beers
    List,
    Add { id: BeerId },
    Remove { id: BeerId },
    /// Show one beer and whether it is a favorite
    Show {
        id: BeerId,

        /// Flip the favorite status after showing it
        #[arg(long)]
        toggle: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;
    init_tracing(&config.logging.filter);

    let services = Services::from_config(config)?;
    match cli.command {
        Command::Browse { search, pages } => browse(&services, search, pages).await,
        Command::Random { count } => random(&services, count).await,
        Command::Favorites { action } => favorites(&services, action).await,
    }
}

async fn browse(services: &Services, search: Option<String>, pages: u32) -> Result<()> {
    let session = services.browsing_session();
    let mut requests = session.requests();
    let mut events = session.events();
    let mut notices = services.errors().subscribe();

    session.send(BrowserIntent::Start);
    let (mut beers, mut is_last_page) = next_page(&mut events, &mut requests, &mut notices).await?;

    if let Some(text) = search {
        session.send(BrowserIntent::SearchTextChanged(text));
        (beers, is_last_page) = next_page(&mut events, &mut requests, &mut notices).await?;
    }

    for _ in 1..pages {
        if is_last_page {
            break;
        }
        session.send(BrowserIntent::ScrolledToEnd);
        (beers, is_last_page) = next_page(&mut events, &mut requests, &mut notices).await?;
    }

    for beer in &beers {
        println!("{:>5}  {}", beer.id, beer.name);
    }
    session.shutdown().await;
    Ok(())
}

/// Wait for the next load to end and return the list it produced.
async fn next_page(
    events: &mut Subscription<BrowserEvent>,
    requests: &mut Subscription<BrowserRequest>,
    notices: &mut Subscription<ErrorNotice>,
) -> Result<(Vec<Beer>, bool)> {
    loop {
        match events.recv().await {
            Some(BrowserEvent::InitialLoadingEnded | BrowserEvent::NextPageLoadingEnded) => break,
            Some(_) => continue,
            None => bail!("Browsing session closed"),
        }
    }
    check_notices(notices)?;

    let mut page = None;
    while let Some(request) = requests.try_recv() {
        if let BrowserRequest::PopulateList {
            beers,
            is_last_page,
        } = request
        {
            page = Some((beers, is_last_page));
        }
    }
    page.ok_or_else(|| anyhow!("Load ended without a result"))
}

async fn random(services: &Services, count: u32) -> Result<()> {
    let session = services.random_session();
    let mut requests = session.requests();
    let mut events = session.events();
    let mut notices = services.errors().subscribe();

    for i in 0..count {
        session.send(if i == 0 {
            RandomIntent::Start
        } else {
            RandomIntent::Reload
        });
        wait_for(&mut events, RandomEvent::LoadingEnded).await?;
        check_notices(&mut notices)?;

        if let Some(RandomRequest::ShowContent(beer)) = requests.try_recv() {
            print_beer(&beer);
        }
    }
    session.shutdown().await;
    Ok(())
}

async fn favorites(services: &Services, action: FavoritesAction) -> Result<()> {
    match action {
        FavoritesAction::List => list_favorites(services).await,
        FavoritesAction::Add { id } => {
            if services.favorites().add(id)? {
                println!("Added {} to favorites", id);
            } else {
                println!("{} is already a favorite", id);
            }
            Ok(())
        }
        FavoritesAction::Remove { id } => {
            if services.favorites().remove(id)? {
                println!("Removed {} from favorites", id);
            } else {
                println!("{} is not a favorite", id);
            }
            Ok(())
        }
        FavoritesAction::Show { id, toggle } => show_beer(services, id, toggle).await,
    }
}

async fn list_favorites(services: &Services) -> Result<()> {
    let session = services.favorites_session();
    let mut requests = session.requests();
    let mut events = session.events();
    let mut notices = services.errors().subscribe();

    let expect_load = !services.favorites().list()?.is_empty();
    session.send(FavoritesIntent::Start);
    if expect_load {
        wait_for(&mut events, FavoritesSessionEvent::LoadingEnded).await?;
    }

    let Some(FavoritesRequest::PopulateList { beers, .. }) = requests.recv().await else {
        bail!("Favorites session closed");
    };
    check_notices(&mut notices)?;

    if beers.is_empty() {
        println!("No favorites yet");
    }
    for beer in &beers {
        println!("{:>5}  {}", beer.id, beer.name);
    }
    session.shutdown().await;
    Ok(())
}

async fn show_beer(services: &Services, id: BeerId, toggle: bool) -> Result<()> {
    let beer = services
        .catalog()
        .beers_by_ids(&[id], 0)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("No beer with id {}", id))?;

    let session = services.detail_session(DetailParams {
        beer,
        is_subview: false,
    });
    let mut requests = session.requests();

    session.send(DetailIntent::Start);
    if toggle {
        session.send(DetailIntent::ToggleFavorite);
    }

    let expected = if toggle { 3 } else { 2 };
    for _ in 0..expected {
        match requests.recv().await {
            Some(DetailRequest::ShowContent {
                image_url,
                name,
                description,
                ..
            }) => {
                println!("{}\n\n{}", name, description);
                if let Some(url) = image_url {
                    println!("\n{}", url);
                }
            }
            Some(DetailRequest::FavoriteStatus(is_favorite)) => {
                println!("\nFavorite: {}", if is_favorite { "yes" } else { "no" });
            }
            None => bail!("Detail session closed"),
        }
    }
    session.shutdown().await;
    Ok(())
}

async fn wait_for<E: PartialEq>(events: &mut Subscription<E>, wanted: E) -> Result<()> {
    loop {
        match events.recv().await {
            Some(event) if event == wanted => return Ok(()),
            Some(_) => continue,
            None => bail!("Session closed"),
        }
    }
}

fn check_notices(notices: &mut Subscription<ErrorNotice>) -> Result<()> {
    match notices.try_recv() {
        Some(notice) => bail!("{} ({})", notice.message, notice.kind),
        None => Ok(()),
    }
}

fn print_beer(beer: &Beer) {
    println!("{:>5}  {}\n       {}", beer.id, beer.name, beer.description);
}
