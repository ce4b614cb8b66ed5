use std::{env, fmt::Display, path::PathBuf, str::FromStr, time::Duration};

use clap::ValueEnum;
use log::{info, warn};

use crate::error::ConfigError;
use crate::parse::Args;

pub const EBIRD_BASE_URL: &str = "https://api.ebird.org/v2";
pub const INATURALIST_BASE_URL: &str = "https://api.inaturalist.org";

/// Downtown Vancouver.
pub const DEFAULT_LAT: f64 = 49.2827;
pub const DEFAULT_LNG: f64 = -123.1207;

pub const DEFAULT_STORE_FILE: &str = "birding-buddy.json";

/// Which flavour of saved list the user keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SavedListKind {
    #[default]
    Checklist,
    Favourites,
}

impl SavedListKind {
    /// Key the list lives under in local storage.
    pub fn storage_key(self) -> &'static str {
        match self {
            SavedListKind::Checklist => "checklist",
            SavedListKind::Favourites => "favs",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SavedListKind::Checklist => "checklist",
            SavedListKind::Favourites => "favourites",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

impl Default for Location {
    fn default() -> Self {
        Self {
            lat: DEFAULT_LAT,
            lng: DEFAULT_LNG,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub ebird_base_url: String,
    pub inaturalist_base_url: String,
    pub token: Option<String>,
    pub location: Location,
    pub store_path: PathBuf,
    pub list: SavedListKind,
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ebird_base_url: EBIRD_BASE_URL.to_string(),
            inaturalist_base_url: INATURALIST_BASE_URL.to_string(),
            token: None,
            location: Location::default(),
            store_path: PathBuf::from(DEFAULT_STORE_FILE),
            list: SavedListKind::default(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl Config {
    /// Defaults, then environment, then command-line flags.
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        Self::layered(args, var)
    }

    /// Flags win; an environment value is only read for settings no flag gave.
    fn layered<F>(args: &Args, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let token = args.token.clone().or_else(|| env("EBIRD_API_TOKEN"));
        let lat = match args.lat {
            Some(lat) => lat,
            None => try_load(&env, "BIRDING_BUDDY_LAT", defaults.location.lat)?,
        };
        let lng = match args.lng {
            Some(lng) => lng,
            None => try_load(&env, "BIRDING_BUDDY_LNG", defaults.location.lng)?,
        };
        let store_path = args
            .store
            .clone()
            .or_else(|| env("BIRDING_BUDDY_STORE").map(PathBuf::from))
            .unwrap_or(defaults.store_path);

        if token.is_none() {
            warn!("No eBird API token configured; sighting requests will be rejected");
        }

        Ok(Self {
            token,
            location: Location { lat, lng },
            store_path,
            list: args.list,
            timeout: Duration::from_secs(args.timeout),
            ..defaults
        })
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn try_load<T, F>(env: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + Display,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    match env(key) {
        Some(value) => match value.trim().parse::<T>() {
            Ok(parsed) => Ok(parsed),
            Err(e) => {
                warn!("Invalid {key} value: {e}");
                Err(ConfigError::Invalid {
                    key,
                    reason: e.to_string(),
                    value,
                })
            }
        },
        None => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}
