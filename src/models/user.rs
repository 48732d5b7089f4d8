//! User models for storage and API.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// User profile stored at `users/{uid}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserProfile {
    /// Identity provider user ID (also the record key)
    pub uid: String,
    pub email: String,
    pub display_name: String,
    /// Account creation time (epoch milliseconds)
    pub created_at: i64,
}

/// Identity returned by the provider after sign-up or sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub uid: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Provider ID token, when the provider issues one
    #[serde(default, skip_serializing)]
    pub id_token: Option<String>,
}

impl SessionUser {
    /// Name shown next to comments: display name, or the email as fallback.
    pub fn author_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.email)
    }
}
