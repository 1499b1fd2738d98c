use chrono::{DateTime as ChronoDateTime, Utc};
use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewKind {
    /// Tied to a completed booking; feeds the car's rating aggregates.
    Car,
    /// Free-standing feedback about the service, no booking required.
    Service,
}

impl ReviewKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewKind::Car => "car",
            ReviewKind::Service => "service",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "car" => Some(ReviewKind::Car),
            "service" => Some(ReviewKind::Service),
            _ => None,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Review {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: ObjectId,
    pub kind: ReviewKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub car_id: Option<ObjectId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_id: Option<ObjectId>,
    pub rating: i32,
    pub comment: String,
    /// Moderation switch. Only active car reviews count toward the car
    /// aggregates.
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub created_at: Option<DateTime>,
    pub updated_at: Option<DateTime>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResponse {
    pub id: String,
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(rename = "type")]
    pub kind: ReviewKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub car_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_id: Option<String>,
    pub rating: i32,
    pub comment: String,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<ChronoDateTime<Utc>>,
}

impl From<&Review> for ReviewResponse {
    fn from(review: &Review) -> Self {
        ReviewResponse {
            id: review.id.map(|id| id.to_hex()).unwrap_or_default(),
            user_id: review.user_id.to_hex(),
            user_name: None,
            kind: review.kind,
            car_id: review.car_id.map(|id| id.to_hex()),
            booking_id: review.booking_id.map(|id| id.to_hex()),
            rating: review.rating,
            comment: review.comment.clone(),
            is_active: review.is_active,
            created_at: review.created_at.map(|dt| dt.to_chrono()),
        }
    }
}

impl ReviewResponse {
    pub fn with_user_name(mut self, name: String) -> Self {
        self.user_name = Some(name);
        self
    }
}
