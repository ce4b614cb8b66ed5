mod config;
mod error;
mod images;
mod parse;
mod reconcile;
mod record;
mod sightings;
mod store;
#[cfg(test)]
mod testing;
mod util;
mod views;

use crate::config::Config;
use crate::images::ImageResolver;
use crate::parse::{Args, Command};
use crate::sightings::{SightingClient, save_to_csv};
use crate::store::{IdentifierStore, LocalStorage, SavedList};
use crate::util::{print_hms, spinner};
use crate::views::{DetailsView, HomeView, SavedListView};
use clap::Parser;
use std::time::Instant;

/// Message reported after toggling `species_code` in the saved list.
pub fn toggle_message(species_code: &str, saved: bool, label: &str) -> String {
    if saved {
        format!("Added {species_code} to your {label}.")
    } else {
        format!("Removed {species_code} from your {label}.")
    }
}

async fn run<S: IdentifierStore>(
    command: Command,
    config: &Config,
    saved: &SavedList<S>,
) -> Result<String, Box<dyn std::error::Error>> {
    let label = saved.kind().label();

    let output = match command {
        Command::Home { search, csv } => {
            let sightings = SightingClient::new(config)?;
            let images = ImageResolver::new(config)?;
            let mut home = HomeView::new(&sightings, &images, saved);

            let progress = spinner("Fetching recent sightings");
            home.mount().await;
            if let Some(term) = search.as_deref() {
                home.search(term).await;
            }
            progress.finish_and_clear();

            if let Some(path) = csv {
                save_to_csv(&home.shown(), &path)?;
            }
            home.render()?
        }
        Command::Details { species_code } => {
            let sightings = SightingClient::new(config)?;
            let images = ImageResolver::new(config)?;

            let progress = spinner("Fetching bird details");
            let recent = sightings.fetch_recent_or_empty().await;
            let view = DetailsView::navigate(&species_code, &recent);
            let rendered = view.render(&images, saved).await?;
            progress.finish_and_clear();
            rendered
        }
        Command::Toggle { species_code } => {
            let now_saved = saved.toggle(&species_code)?;
            toggle_message(&species_code, now_saved, label)
        }
        Command::Remove { species_code } => {
            if saved.remove(&species_code)? {
                toggle_message(&species_code, false, label)
            } else {
                format!("{species_code} is not in your {label}.")
            }
        }
        Command::Saved { images, concurrent } => {
            let sightings = SightingClient::new(config)?;
            let mut view = SavedListView::new(saved);

            let progress = spinner("Fetching recent sightings");
            view.mount(&sightings).await;
            let urls = if images {
                let resolver = ImageResolver::new(config)?;
                let names: Vec<String> = view
                    .state()
                    .records()
                    .iter()
                    .map(|r| r.com_name.clone())
                    .collect();
                Some(resolver.resolve_many(&names, concurrent).await)
            } else {
                None
            };
            progress.finish_and_clear();

            view.render(urls.as_deref())?
        }
    };
    Ok(output)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::try_parse()?;
    // Initialize logger
    let default_filter = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let config = Config::load(&args)?;
    let saved = SavedList::new(LocalStorage::new(&config.store_path), config.list);

    let start = Instant::now();
    let output = run(args.command, &config, &saved).await?;
    print!("{output}");
    if !output.ends_with('\n') {
        println!();
    }
    print_hms(&start);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SavedListKind;
    use crate::store::MemoryStore;
    use crate::testing::closed_base_url;
    use std::time::Duration;

    async fn offline_config() -> Config {
        Config {
            ebird_base_url: closed_base_url().await,
            inaturalist_base_url: closed_base_url().await,
            timeout: Duration::from_secs(5),
            ..Config::default()
        }
    }

    #[test]
    fn test_toggle_message() {
        assert_eq!(
            toggle_message("amerob", true, "checklist"),
            "Added amerob to your checklist."
        );
        assert_eq!(
            toggle_message("amerob", false, "favourites"),
            "Removed amerob from your favourites."
        );
    }

    #[tokio::test]
    async fn test_toggle_command_twice() {
        let config = offline_config().await;
        let saved = SavedList::new(MemoryStore::new(), SavedListKind::Checklist);

        let toggle = || Command::Toggle {
            species_code: "amerob".to_string(),
        };
        let first = run(toggle(), &config, &saved).await.unwrap();
        assert_eq!(first, "Added amerob to your checklist.");
        let second = run(toggle(), &config, &saved).await.unwrap();
        assert_eq!(second, "Removed amerob from your checklist.");
        assert!(saved.ids().is_empty());
    }

    #[tokio::test]
    async fn test_remove_unknown_species() {
        let config = offline_config().await;
        let saved = SavedList::new(MemoryStore::new(), SavedListKind::Favourites);
        let out = run(
            Command::Remove {
                species_code: "blujay".to_string(),
            },
            &config,
            &saved,
        )
        .await
        .unwrap();
        assert_eq!(out, "blujay is not in your favourites.");
    }

    #[tokio::test]
    async fn test_details_offline_has_no_details() {
        let config = offline_config().await;
        let saved = SavedList::new(MemoryStore::new(), SavedListKind::Checklist);
        let out = run(
            Command::Details {
                species_code: "amerob".to_string(),
            },
            &config,
            &saved,
        )
        .await
        .unwrap();
        assert_eq!(out.trim(), views::NO_DETAILS);
    }

    #[tokio::test]
    async fn test_home_offline_shows_nothing() {
        let config = offline_config().await;
        let saved = SavedList::new(MemoryStore::new(), SavedListKind::Checklist);
        let out = run(
            Command::Home {
                search: Some("robin".to_string()),
                csv: None,
            },
            &config,
            &saved,
        )
        .await
        .unwrap();
        assert!(out.contains("No sightings to show."));
        assert!(!out.contains("Bird of the Day"));
    }
}
