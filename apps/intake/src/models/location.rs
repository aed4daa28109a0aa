use serde::{Deserialize, Serialize};

use super::de_id;

/// One entry of a country, state or city list.
///
/// The backend names the display field after the level (`country_name`,
/// `state_name`, `city_name`); all three land in `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationOption {
    #[serde(deserialize_with = "de_id")]
    pub id: i64,
    #[serde(alias = "country_name", alias = "state_name", alias = "city_name")]
    pub name: String,
}

impl LocationOption {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Looks up the display name for `id` in an already-fetched list.
pub fn find_name(options: &[LocationOption], id: i64) -> Option<&str> {
    options
        .iter()
        .find(|o| o.id == id)
        .map(|o| o.name.as_str())
}
