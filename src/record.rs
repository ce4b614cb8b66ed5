use serde::{Deserialize, Serialize};

/// One recent observation as returned by the eBird geo endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SightingRecord {
    pub species_code: String,
    pub com_name: String,
    pub sci_name: String,
    #[serde(default)]
    pub obs_dt: String,
    #[serde(default)]
    pub how_many: Option<u32>,
    #[serde(default)]
    pub loc_name: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub obs_valid: bool,
}

impl SightingRecord {
    pub fn map_link(&self) -> String {
        format!("https://www.google.com/maps?q={},{}", self.lat, self.lng)
    }
}

#[cfg(test)]
pub(crate) fn sample(species_code: &str, com_name: &str) -> SightingRecord {
    SightingRecord {
        species_code: species_code.to_string(),
        com_name: com_name.to_string(),
        sci_name: format!("{com_name} sci"),
        obs_dt: "2024-05-01 08:15".to_string(),
        how_many: Some(1),
        loc_name: "Stanley Park".to_string(),
        lat: 49.3017,
        lng: -123.1417,
        obs_valid: true,
    }
}
