use chrono::{DateTime as ChronoDateTime, Utc};
use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    User,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Admin => "admin",
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    /// Stored lowercase so uniqueness is case-insensitive.
    pub email: String,
    pub password: String, // Always hashed
    pub phone: String,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Renter rating aggregate. Carried on the document, surfaced in the
    /// admin listing; nothing in the booking core writes it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_rating: Option<f64>,
    // Password reset state, cleared once the reset completes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_otp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_otp_expires: Option<DateTime>,
    pub created_at: Option<DateTime>,
    pub updated_at: Option<DateTime>,
}

impl User {
    /// Tombstone values written by the admin soft delete. The record is
    /// retained; the identifying fields are overwritten.
    pub fn tombstone_email(id: &ObjectId) -> String {
        format!("deleted_{}@deleted.local", id.to_hex())
    }
}

/// User shape safe to return to clients: no password hash, no OTP state.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPublic {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: UserRole,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<ChronoDateTime<Utc>>,
}

impl From<&User> for UserPublic {
    fn from(user: &User) -> Self {
        UserPublic {
            id: user.id.map(|id| id.to_hex()).unwrap_or_default(),
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            role: user.role,
            is_active: user.is_active,
            license_number: user.license_number.clone(),
            address: user.address.clone(),
            average_rating: user.average_rating,
            created_at: user.created_at.map(|dt| dt.to_chrono()),
        }
    }
}
