use serde::{Deserialize, Serialize};

use super::de_id;

/// Draft-store key holding the logged-in organization for a profile.
pub const AUTH_KEY: &str = "auth";
/// Draft-store key holding the open calendar log id; forgotten on logout.
pub const CALENDAR_ID_KEY: &str = "calendar_id";

/// The organization session stored after login. `id` is the organization id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    #[serde(deserialize_with = "de_id")]
    pub id: i64,
    #[serde(default)]
    pub org_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}
