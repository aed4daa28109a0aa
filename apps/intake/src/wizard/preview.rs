use serde::{Deserialize, Serialize};

use super::cascade::LocationCascade;
use super::forms::{AddressInfo, BasicInfo};
use crate::models::location::{find_name, LocationOption};

/// Read-only projection of both form groups with resolved location names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preview {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub country_id: Option<i64>,
    pub state_id: Option<i64>,
    pub city_id: Option<i64>,
    pub pincode: String,
    pub country_name: String,
    pub state_name: String,
    pub city_name: String,
    pub image: Option<String>,
}

impl Preview {
    /// Rebuilds the projection from the forms.
    ///
    /// A name whose list has not arrived yet is carried over from `previous`
    /// as long as the id is unchanged, so a restored preview keeps its names
    /// until the cascade catches up.
    pub fn build(
        basic: &BasicInfo,
        address: &AddressInfo,
        cascade: &LocationCascade,
        previous: &Preview,
    ) -> Preview {
        let country_name = resolve(
            cascade.countries(),
            address.country_id,
            previous.country_id,
            &previous.country_name,
        );
        let state_name = resolve(
            cascade.states(),
            address.state_id,
            previous.state_id,
            &previous.state_name,
        );
        let city_name = resolve(
            cascade.cities(),
            address.city_id,
            previous.city_id,
            &previous.city_name,
        );

        Preview {
            name: basic.name.clone(),
            email: basic.email.clone(),
            phone: basic.phone.clone(),
            address: address.address.clone(),
            country_id: address.country_id,
            state_id: address.state_id,
            city_id: address.city_id,
            pincode: address.pincode.clone(),
            country_name,
            state_name,
            city_name,
            image: previous.image.clone(),
        }
    }
}

fn resolve(
    options: &[LocationOption],
    id: Option<i64>,
    previous_id: Option<i64>,
    previous_name: &str,
) -> String {
    let Some(id) = id else {
        return String::new();
    };
    match find_name(options, id) {
        Some(name) => name.to_string(),
        None if previous_id == Some(id) => previous_name.to_string(),
        None => String::new(),
    }
}
