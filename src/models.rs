use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::pagination::PageInfo;

// --- Stored Records ---

/// User
///
/// A conference participant or administrator from the `users` table. `authority` is the
/// role embedded in issued tokens. The password hash is never serialized.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Default)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    pub name: String,
    #[serde(skip_serializing, default)]
    pub password: String,
    pub email: String,
    pub gender: String,
    pub institute: String,
    pub arrival_date: Option<DateTime<Utc>>,
    pub departure_date: Option<DateTime<Utc>>,
    pub room: String,
    pub diet_requirement: String,
    pub talk_title: String,
    pub talk_abstract: String,
    pub phone: String,
    // Registration confirmed.
    pub status: bool,
    pub authority: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Columns a client may sort users by.
pub const USER_SORTABLE: &[&str] = &[
    "id",
    "username",
    "name",
    "email",
    "institute",
    "arrival_date",
    "departure_date",
    "room",
    "status",
    "authority",
    "created_at",
    "updated_at",
];

/// Notification
///
/// An announcement shown to participants.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Default)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const NOTIFICATION_SORTABLE: &[&str] = &["id", "title", "created_at", "updated_at"];

// --- Request Payloads ---

/// UserInput
///
/// Body for registration, admin user creation and updates. Every field is optional so
/// the same shape serves partial updates; `id` and unknown fields are ignored.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserInput {
    pub username: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
    pub email: Option<String>,
    pub gender: Option<String>,
    pub institute: Option<String>,
    pub arrival_date: Option<DateTime<Utc>>,
    pub departure_date: Option<DateTime<Utc>>,
    pub room: Option<String>,
    pub diet_requirement: Option<String>,
    pub talk_title: Option<String>,
    pub talk_abstract: Option<String>,
    pub phone: Option<String>,
    pub status: Option<bool>,
    pub authority: Option<String>,
}

/// UserChanges
///
/// What the repository writes: a `UserInput` with the password already hashed.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub name: Option<String>,
    pub password_hash: Option<String>,
    pub email: Option<String>,
    pub gender: Option<String>,
    pub institute: Option<String>,
    pub arrival_date: Option<DateTime<Utc>>,
    pub departure_date: Option<DateTime<Utc>>,
    pub room: Option<String>,
    pub diet_requirement: Option<String>,
    pub talk_title: Option<String>,
    pub talk_abstract: Option<String>,
    pub phone: Option<String>,
    pub status: Option<bool>,
    pub authority: Option<String>,
}

impl UserChanges {
    pub fn from_input(input: UserInput, password_hash: Option<String>) -> Self {
        Self {
            username: input.username,
            name: input.name,
            password_hash,
            email: input.email,
            gender: input.gender,
            institute: input.institute,
            arrival_date: input.arrival_date,
            departure_date: input.departure_date,
            room: input.room,
            diet_requirement: input.diet_requirement,
            talk_title: input.talk_title,
            talk_abstract: input.talk_abstract,
            phone: input.phone,
            status: input.status,
            authority: input.authority,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoginRequest {
    /// Username or email.
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ValidateRequest {
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NotificationInput {
    pub title: Option<String>,
    pub content: Option<String>,
}

/// Body of the batch delete endpoints: `{"id": [1, 2, 3]}`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BatchDeleteRequest {
    #[serde(default)]
    pub id: Vec<i64>,
}

// --- Response Payloads ---

#[derive(Debug, Clone, Serialize)]
pub struct AuthPayload {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidatePayload {
    pub isvalid: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserPage {
    #[serde(flatten)]
    pub page: PageInfo,
    pub users: Vec<User>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NotificationPage {
    #[serde(flatten)]
    pub page: PageInfo,
    pub notifications: Vec<Notification>,
}
