//! Text renderings of the Home, Bird Details and saved-list screens.

use std::fmt::{self, Write};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use log::{debug, error, info};

use crate::config::SavedListKind;
use crate::images::ImageResolver;
use crate::reconcile::{SavedListLoad, missing, pick_random};
use crate::record::SightingRecord;
use crate::sightings::{SightingClient, search};
use crate::store::{IdentifierStore, SavedList};

pub const NO_DETAILS: &str = "No details available for this bird.";

/// Hands out increasing tickets so only the newest request's result lands.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    dispatched: AtomicU64,
}

impl RequestSequencer {
    pub fn dispatch(&self) -> u64 {
        self.dispatched.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn is_latest(&self, ticket: u64) -> bool {
        self.dispatched.load(Ordering::SeqCst) == ticket
    }
}

/// State written only by the most recently dispatched request.
#[derive(Debug, Default)]
pub struct LatestWins<T> {
    sequencer: RequestSequencer,
    value: Mutex<T>,
}

impl<T: Clone> LatestWins<T> {
    pub fn new(value: T) -> Self {
        Self {
            sequencer: RequestSequencer::default(),
            value: Mutex::new(value),
        }
    }

    pub fn dispatch(&self) -> u64 {
        self.sequencer.dispatch()
    }

    /// Stores `value` if `ticket` is still the newest; stale results are dropped.
    pub fn apply(&self, ticket: u64, value: T) -> bool {
        let mut current = self.value.lock().unwrap_or_else(|p| p.into_inner());
        if !self.sequencer.is_latest(ticket) {
            debug!("Discarding stale result for request {}", ticket);
            return false;
        }
        *current = value;
        true
    }

    pub fn get(&self) -> T {
        self.value.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

pub struct HomeView<'a, S> {
    sightings: &'a SightingClient,
    images: &'a ImageResolver,
    saved: &'a SavedList<S>,
    shown: LatestWins<Vec<SightingRecord>>,
    featured: Option<(SightingRecord, String)>,
}

impl<'a, S: IdentifierStore> HomeView<'a, S> {
    pub fn new(
        sightings: &'a SightingClient,
        images: &'a ImageResolver,
        saved: &'a SavedList<S>,
    ) -> Self {
        Self {
            sightings,
            images,
            saved,
            shown: LatestWins::new(Vec::new()),
            featured: None,
        }
    }

    /// Initial load: every recent sighting plus a bird of the day.
    pub async fn mount(&mut self) {
        let ticket = self.shown.dispatch();
        let recent = self.sightings.fetch_recent_or_empty().await;

        if let Some(bird) = pick_random(&recent) {
            let image = self.images.resolve_image(&bird.com_name).await;
            info!("Bird of the day: {}", bird.com_name);
            self.featured = Some((bird, image));
        }
        self.shown.apply(ticket, recent);
    }

    /// Re-fetch and keep only birds whose name contains `term`.
    pub async fn search(&self, term: &str) {
        let ticket = self.shown.dispatch();
        let recent = self.sightings.fetch_recent_or_empty().await;
        self.shown.apply(ticket, search(&recent, term));
    }

    pub fn shown(&self) -> Vec<SightingRecord> {
        self.shown.get()
    }

    pub fn render(&self) -> Result<String, fmt::Error> {
        let mut out = String::new();
        writeln!(out, "Browse Birds\n")?;

        if let Some((bird, image)) = &self.featured {
            writeln!(out, "Bird of the Day: {} ({})", bird.com_name, bird.species_code)?;
            writeln!(out, "  {}\n", image)?;
        }

        let shown = self.shown();
        if shown.is_empty() {
            writeln!(out, "No sightings to show.")?;
            return Ok(out);
        }

        let saved = self.saved.ids();
        let marker = self.saved.kind().label();
        let width = shown.iter().map(|r| r.com_name.len()).max().unwrap_or(0);
        for record in &shown {
            let mark = if saved.contains(&record.species_code) {
                format!("[in {marker}]")
            } else {
                String::new()
            };
            writeln!(
                out,
                "{:<10} {:<width$}  {}",
                record.species_code, record.com_name, mark
            )?;
        }
        Ok(out)
    }
}

/// Details for the record handed over by the screen the user came from.
pub struct DetailsView {
    bird: Option<SightingRecord>,
}

impl DetailsView {
    pub fn new(bird: Option<SightingRecord>) -> Self {
        Self { bird }
    }

    /// Pick the selected record out of a list, as following a link would.
    pub fn navigate(species_code: &str, from: &[SightingRecord]) -> Self {
        Self::new(
            from.iter()
                .find(|record| record.species_code == species_code)
                .cloned(),
        )
    }

    pub async fn render<S: IdentifierStore>(
        &self,
        images: &ImageResolver,
        saved: &SavedList<S>,
    ) -> Result<String, fmt::Error> {
        let Some(bird) = &self.bird else {
            return Ok(format!("{NO_DETAILS}\n"));
        };

        let image = images.resolve_image(&bird.com_name).await;
        render_details(bird, &image, saved.contains(&bird.species_code))
    }
}

pub fn render_details(
    bird: &SightingRecord,
    image: &str,
    seen: bool,
) -> Result<String, fmt::Error> {
    let mut out = String::new();
    writeln!(out, "{}", bird.com_name)?;
    writeln!(out, "{}", bird.sci_name)?;
    writeln!(out, "Seen: {}", if seen { "[x]" } else { "[ ]" })?;
    writeln!(out, "Image: {image}\n")?;
    writeln!(out, "Latest Observation Details")?;
    writeln!(out, "Observation Date: {}", bird.obs_dt)?;
    writeln!(
        out,
        "Number Observed: {}",
        bird.how_many.map(|n| n.to_string()).unwrap_or_default()
    )?;
    writeln!(out, "Location: {}", bird.loc_name)?;
    writeln!(out, "Coordinates: {:.3}, {:.3}", bird.lat, bird.lng)?;
    writeln!(out, "Map Location: {}", bird.map_link())?;
    writeln!(
        out,
        "Observation Valid: {}",
        if bird.obs_valid { "Yes" } else { "No" }
    )?;
    Ok(out)
}

/// Saved species that show up in the latest sightings.
pub struct SavedListView<'a, S> {
    saved: &'a SavedList<S>,
    state: SavedListLoad,
    hidden: usize,
}

impl<'a, S: IdentifierStore> SavedListView<'a, S> {
    pub fn new(saved: &'a SavedList<S>) -> Self {
        Self {
            saved,
            state: SavedListLoad::Idle,
            hidden: 0,
        }
    }

    pub async fn mount(&mut self, sightings: &SightingClient) {
        let ids = self.saved.ids();
        self.state = std::mem::take(&mut self.state).start();

        let fetched = sightings.fetch_recent().await;
        match &fetched {
            Ok(fresh) => self.hidden = missing(&ids, fresh).len(),
            Err(e) => error!("Error fetching bird sightings: {}", e),
        }
        self.state = std::mem::take(&mut self.state).finish(&ids, fetched);
    }

    pub fn state(&self) -> &SavedListLoad {
        &self.state
    }

    pub fn kind(&self) -> SavedListKind {
        self.saved.kind()
    }

    pub fn render(&self, images: Option<&[String]>) -> Result<String, fmt::Error> {
        let label = self.kind().label();
        let mut out = String::new();
        writeln!(out, "Your {}\n", title_case(label))?;

        let records = self.state.records();
        if records.is_empty() {
            if let SavedListLoad::FetchFailed = self.state {
                debug!("Rendering empty {} after failed fetch", label);
            }
            writeln!(out, "Your {label} is currently empty.")?;
        } else {
            for (i, record) in records.iter().enumerate() {
                writeln!(out, "[x] {:<10} {}", record.species_code, record.com_name)?;
                if let Some(url) = images.and_then(|urls| urls.get(i)) {
                    writeln!(out, "    {url}")?;
                }
            }
        }

        if self.hidden > 0 {
            writeln!(
                out,
                "\n{} saved species not sighted recently (still in your {label}).",
                self.hidden
            )?;
        }
        Ok(out)
    }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
