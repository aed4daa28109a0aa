//! Country → state → city option lists.
//!
//! Lists are fetched asynchronously and may come back in any order. Every
//! request carries a [`FetchTag`]; a response is applied only while its tag
//! is still the outstanding one for that list. Selecting a new country
//! supersedes both the states and the cities fetch; selecting a state
//! supersedes only the cities fetch.

use serde::Serialize;
use tracing::{debug, warn};

use crate::backend::{BackendError, LocationResolver};
use crate::models::location::LocationOption;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FetchTag {
    pub seq: u64,
    pub parent_id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationRequest {
    States { country_id: i64, tag: FetchTag },
    Cities { state_id: i64, tag: FetchTag },
}

#[derive(Debug)]
pub struct LocationResponse {
    pub request: LocationRequest,
    pub result: Result<Vec<LocationOption>, BackendError>,
}

#[derive(Debug, Default)]
pub struct LocationCascade {
    countries: Vec<LocationOption>,
    states: Vec<LocationOption>,
    cities: Vec<LocationOption>,
    pending_states: Option<FetchTag>,
    pending_cities: Option<FetchTag>,
    seq: u64,
}

impl LocationCascade {
    pub fn countries(&self) -> &[LocationOption] {
        &self.countries
    }

    pub fn states(&self) -> &[LocationOption] {
        &self.states
    }

    pub fn cities(&self) -> &[LocationOption] {
        &self.cities
    }

    /// A populated city list exists for the selected state.
    pub fn cities_available(&self) -> bool {
        !self.cities.is_empty()
    }

    pub fn set_countries(&mut self, countries: Vec<LocationOption>) {
        self.countries = countries;
    }

    fn next_tag(&mut self, parent_id: i64) -> FetchTag {
        self.seq += 1;
        FetchTag {
            seq: self.seq,
            parent_id,
        }
    }

    /// Clears the state and city lists and, for a concrete country, issues
    /// the states fetch that now owns the states list.
    pub fn select_country(&mut self, country_id: Option<i64>) -> Option<LocationRequest> {
        self.states.clear();
        self.cities.clear();
        self.pending_cities = None;
        let tag = country_id.map(|id| self.next_tag(id));
        self.pending_states = tag;
        tag.map(|tag| LocationRequest::States {
            country_id: tag.parent_id,
            tag,
        })
    }

    /// Clears the city list and, for a concrete state, issues the cities fetch.
    pub fn select_state(&mut self, state_id: Option<i64>) -> Option<LocationRequest> {
        self.cities.clear();
        let tag = state_id.map(|id| self.next_tag(id));
        self.pending_cities = tag;
        tag.map(|tag| LocationRequest::Cities {
            state_id: tag.parent_id,
            tag,
        })
    }

    /// Applies a fetch result. Returns `false` when the response was stale
    /// and dropped.
    pub fn apply(&mut self, response: LocationResponse) -> bool {
        let (pending, list, kind, tag) = match response.request {
            LocationRequest::States { tag, .. } => {
                (&mut self.pending_states, &mut self.states, "states", tag)
            }
            LocationRequest::Cities { tag, .. } => {
                (&mut self.pending_cities, &mut self.cities, "cities", tag)
            }
        };

        if *pending != Some(tag) {
            debug!(
                "Dropping stale {} list for parent {} (seq {})",
                kind, tag.parent_id, tag.seq
            );
            return false;
        }
        *pending = None;

        match response.result {
            Ok(options) => *list = options,
            Err(e) => {
                warn!("Failed to load {} for parent {}: {}", kind, tag.parent_id, e);
                list.clear();
            }
        }
        true
    }
}

/// Runs the lookup a request describes.
pub async fn fetch(resolver: &dyn LocationResolver, request: LocationRequest) -> LocationResponse {
    let result = match request {
        LocationRequest::States { country_id, .. } => resolver.states_of(country_id).await,
        LocationRequest::Cities { state_id, .. } => resolver.cities_of(state_id).await,
    };
    LocationResponse { request, result }
}
