use std::collections::HashSet;

use rand::seq::IndexedRandom;

use crate::error::FetchError;
use crate::record::SightingRecord;

/// Fresh records whose species is saved, in fetch order.
///
/// Saved species missing from `fresh` are left out; they stay saved.
pub fn reconcile(saved_ids: &[String], fresh: &[SightingRecord]) -> Vec<SightingRecord> {
    let saved: HashSet<&str> = saved_ids.iter().map(String::as_str).collect();
    fresh
        .iter()
        .filter(|record| saved.contains(record.species_code.as_str()))
        .cloned()
        .collect()
}

/// Saved ids that [`reconcile`] would hide for this fetch.
pub fn missing(saved_ids: &[String], fresh: &[SightingRecord]) -> Vec<String> {
    let seen: HashSet<&str> = fresh.iter().map(|r| r.species_code.as_str()).collect();
    saved_ids
        .iter()
        .filter(|id| !seen.contains(id.as_str()))
        .cloned()
        .collect()
}

pub fn pick_random(records: &[SightingRecord]) -> Option<SightingRecord> {
    records.choose(&mut rand::rng()).cloned()
}

/// Progress of one saved-list load.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SavedListLoad {
    #[default]
    Idle,
    Loading,
    Reconciled(Vec<SightingRecord>),
    FetchFailed,
}

impl SavedListLoad {
    pub fn start(self) -> Self {
        match self {
            SavedListLoad::Idle => SavedListLoad::Loading,
            other => other,
        }
    }

    /// Settle a pending load. Anything but `Loading` ignores the result.
    pub fn finish(
        self,
        saved_ids: &[String],
        fetched: Result<Vec<SightingRecord>, FetchError>,
    ) -> Self {
        match self {
            SavedListLoad::Loading => match fetched {
                Ok(fresh) => SavedListLoad::Reconciled(reconcile(saved_ids, &fresh)),
                Err(_) => SavedListLoad::FetchFailed,
            },
            other => other,
        }
    }

    /// Rows to render; empty unless reconciled.
    pub fn records(&self) -> &[SightingRecord] {
        match self {
            SavedListLoad::Reconciled(records) => records,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::sample;
    use rstest::rstest;

    fn ids(codes: &[&str]) -> Vec<String> {
        codes.iter().map(|c| c.to_string()).collect()
    }

    fn fresh() -> Vec<SightingRecord> {
        vec![
            sample("cangoo", "Canada Goose"),
            sample("amerob", "American Robin"),
            sample("norfli", "Northern Flicker"),
        ]
    }

    #[test]
    fn test_saved_but_not_recent_is_dropped() {
        let saved = ids(&["amerob", "blujay"]);
        let fresh = vec![sample("amerob", "American Robin"), sample("cangoo", "Canada Goose")];

        let result = reconcile(&saved, &fresh);
        assert_eq!(result, vec![sample("amerob", "American Robin")]);
        assert_eq!(missing(&saved, &fresh), ids(&["blujay"]));
    }

    #[test]
    fn test_order_follows_fetch() {
        let saved = ids(&["norfli", "cangoo"]);
        let codes: Vec<_> = reconcile(&saved, &fresh())
            .into_iter()
            .map(|r| r.species_code)
            .collect();
        assert_eq!(codes, vec!["cangoo", "norfli"]);
    }

    #[rstest]
    #[case(&[])]
    #[case(&["amerob"])]
    #[case(&["amerob", "norfli", "cangoo", "blujay"])]
    #[case(&["hoocro"])]
    fn test_result_is_saved_subset(#[case] saved: &[&str]) {
        let saved = ids(saved);
        let result = reconcile(&saved, &fresh());
        assert!(result.len() <= fresh().len());
        assert!(result.iter().all(|r| saved.contains(&r.species_code)));
        if saved.is_empty() {
            assert!(result.is_empty());
        }
    }

    #[test]
    fn test_pick_random() {
        assert_eq!(pick_random(&[]), None);
        let only = sample("amerob", "American Robin");
        assert_eq!(pick_random(std::slice::from_ref(&only)), Some(only));

        let picked = pick_random(&fresh()).unwrap();
        assert!(fresh().contains(&picked));
    }

    #[test]
    fn test_load_reconciles() {
        let saved = ids(&["amerob"]);
        let state = SavedListLoad::default().start();
        assert_eq!(state, SavedListLoad::Loading);

        let state = state.finish(&saved, Ok(fresh()));
        assert_eq!(state.records(), &[sample("amerob", "American Robin")]);
    }

    #[test]
    fn test_failed_load_is_terminal() {
        let saved = ids(&["amerob"]);
        let err = FetchError::Status {
            url: "http://localhost".to_string(),
            status: 500,
        };
        let state = SavedListLoad::Idle.start().finish(&saved, Err(err));
        assert_eq!(state, SavedListLoad::FetchFailed);
        assert!(state.records().is_empty());

        let state = state.start().finish(&saved, Ok(fresh()));
        assert_eq!(state, SavedListLoad::FetchFailed);
    }
}
