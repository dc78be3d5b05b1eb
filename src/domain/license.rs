use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stored license application. Attachments are kept as base64 text.
///
/// The JSON representation keeps the wire names clients already rely on: `_id` is the store
/// identifier while `id` is the identifier typed by the applicant.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct License {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "id", default, skip_serializing_if = "Option::is_none")]
    pub applicant_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle_no: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chess_no: Option<String>,
    pub photo: String,
    pub nid_copy: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub present_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permanent_address: Option<String>,
    pub created_at: DateTime<Utc>,
}
