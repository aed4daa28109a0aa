use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::de_opt_id;

/// Local-part and domain grammar accepted for candidate emails.
/// Length limits (254 overall, 64 local) are checked separately.
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[a-zA-Z0-9!#$%&'*+/=?^_`{|}~-]+)*@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .expect("email pattern is valid")
});

static PINCODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{6}$").expect("pincode pattern is valid"));

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BasicInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressInfo {
    pub address: String,
    #[serde(deserialize_with = "de_opt_id")]
    pub country_id: Option<i64>,
    #[serde(deserialize_with = "de_opt_id")]
    pub state_id: Option<i64>,
    #[serde(deserialize_with = "de_opt_id")]
    pub city_id: Option<i64>,
    pub pincode: String,
    pub image: Option<ImageField>,
}

/// What the image field of the address group currently holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ImageField {
    /// Image reference already stored by the backend.
    Stored(String),
    /// File name of a local upload awaiting submission.
    Staged(String),
}

impl ImageField {
    pub fn value(&self) -> &str {
        match self {
            ImageField::Stored(v) | ImageField::Staged(v) => v,
        }
    }
}

/// Partial update of the basic-info group; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BasicInfoPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Partial update of the free-text address fields and the city selection.
/// Country and state go through their own cascade operations.
///
/// `city_id: None` leaves the city alone; `clear_city` deselects it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddressPatch {
    pub address: Option<String>,
    pub pincode: Option<String>,
    pub city_id: Option<i64>,
    #[serde(default)]
    pub clear_city: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

impl FieldError {
    fn new(field: &'static str, message: &'static str) -> Self {
        Self { field, message }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub fields: Vec<FieldError>,
}

fn filled(value: &str) -> bool {
    !value.trim().is_empty()
}

pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    let local_len = email.split('@').next().map(str::len).unwrap_or(0);
    !email.is_empty() && email.len() <= 254 && local_len <= 64 && EMAIL_RE.is_match(email)
}

pub fn is_valid_pincode(pincode: &str) -> bool {
    PINCODE_RE.is_match(pincode.trim())
}

impl BasicInfo {
    pub fn apply(&mut self, patch: BasicInfoPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(phone) = patch.phone {
            self.phone = phone;
        }
    }

    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if !filled(&self.name) {
            errors.push(FieldError::new("name", "Name is required"));
        }
        if !filled(&self.email) {
            errors.push(FieldError::new("email", "Email is required"));
        } else if !is_valid_email(&self.email) {
            errors.push(FieldError::new("email", "Enter a valid email address"));
        }
        if !filled(&self.phone) {
            errors.push(FieldError::new("phone", "Phone is required"));
        }
        errors
    }
}

impl AddressInfo {
    pub fn apply(&mut self, patch: AddressPatch) {
        if let Some(address) = patch.address {
            self.address = address;
        }
        if let Some(pincode) = patch.pincode {
            self.pincode = pincode;
        }
        if patch.clear_city {
            self.city_id = None;
        } else if let Some(city_id) = patch.city_id {
            self.city_id = Some(city_id);
        }
    }

    /// `cities_available` says whether the selected state has a populated
    /// city list; only then is a city required.
    pub fn validate(&self, cities_available: bool) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if !filled(&self.address) {
            errors.push(FieldError::new("address", "Address is required"));
        }
        if self.country_id.is_none() {
            errors.push(FieldError::new("country_id", "Country is required"));
        }
        if self.state_id.is_none() {
            errors.push(FieldError::new("state_id", "State is required"));
        }
        if cities_available && self.city_id.is_none() {
            errors.push(FieldError::new("city_id", "City is required"));
        }
        if !filled(&self.pincode) {
            errors.push(FieldError::new("pincode", "Pincode is required"));
        } else if !is_valid_pincode(&self.pincode) {
            errors.push(FieldError::new("pincode", "Pincode must be 6 digits"));
        }
        errors
    }
}

/// Share of non-empty fields across both groups, rounded to a whole percent.
/// Validity is not considered.
pub fn progress(basic: &BasicInfo, address: &AddressInfo) -> u8 {
    let fields = [
        filled(&basic.name),
        filled(&basic.email),
        filled(&basic.phone),
        filled(&address.address),
        address.country_id.is_some(),
        address.state_id.is_some(),
        address.city_id.is_some(),
        filled(&address.pincode),
        address.image.as_ref().is_some_and(|i| filled(i.value())),
    ];
    let done = fields.iter().filter(|f| **f).count();
    ((done as f64 / fields.len() as f64) * 100.0).round() as u8
}
