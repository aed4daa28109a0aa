use serde::{Deserialize, Serialize};

use super::{de_opt_id, de_text};

/// A feature module enabled for an organization, as listed in its sidebar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrgModule {
    #[serde(default, deserialize_with = "de_opt_id")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "de_text")]
    pub module_name: String,
}

impl OrgModule {
    /// Lower-cased name used as the section key.
    pub fn section(&self) -> String {
        self.module_name.trim().to_lowercase()
    }
}

/// The section opened by default: the first module's.
pub fn default_section(modules: &[OrgModule]) -> Option<String> {
    modules.first().map(OrgModule::section)
}
