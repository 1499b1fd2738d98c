use chrono::{DateTime as ChronoDateTime, Utc};
use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CarType {
    #[serde(rename = "SUV")]
    Suv,
    Sedan,
    Hatchback,
    #[serde(rename = "MPV")]
    Mpv,
    Luxury,
    Sports,
}

impl CarType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CarType::Suv => "SUV",
            CarType::Sedan => "Sedan",
            CarType::Hatchback => "Hatchback",
            CarType::Mpv => "MPV",
            CarType::Luxury => "Luxury",
            CarType::Sports => "Sports",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "SUV" => Some(CarType::Suv),
            "Sedan" => Some(CarType::Sedan),
            "Hatchback" => Some(CarType::Hatchback),
            "MPV" => Some(CarType::Mpv),
            "Luxury" => Some(CarType::Luxury),
            "Sports" => Some(CarType::Sports),
            _ => None,
        }
    }
}

/// Star counts for ratings 1 through 5.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RatingBreakdown {
    #[serde(rename = "1", default)]
    pub one: i32,
    #[serde(rename = "2", default)]
    pub two: i32,
    #[serde(rename = "3", default)]
    pub three: i32,
    #[serde(rename = "4", default)]
    pub four: i32,
    #[serde(rename = "5", default)]
    pub five: i32,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Car {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub car_type: CarType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_number: Option<String>,
    pub price_per_day: f64,
    pub price_per_hour: f64,
    /// Cached availability flag. Mutated only through the booking
    /// transition table and the admin direct override.
    #[serde(default = "default_true")]
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    // Review aggregates, recomputed from active car reviews
    #[serde(default)]
    pub average_rating: f64,
    #[serde(default)]
    pub total_reviews: i64,
    #[serde(default)]
    pub rating_breakdown: RatingBreakdown,
    pub created_at: Option<DateTime>,
    pub updated_at: Option<DateTime>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CarResponse {
    pub id: String,
    pub make: String,
    pub model: String,
    pub year: i32,
    #[serde(rename = "type")]
    pub car_type: CarType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_number: Option<String>,
    pub price_per_day: f64,
    pub price_per_hour: f64,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub average_rating: f64,
    pub total_reviews: i64,
    pub rating_breakdown: RatingBreakdown,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<ChronoDateTime<Utc>>,
}

impl From<&Car> for CarResponse {
    fn from(car: &Car) -> Self {
        CarResponse {
            id: car.id.map(|id| id.to_hex()).unwrap_or_default(),
            make: car.make.clone(),
            model: car.model.clone(),
            year: car.year,
            car_type: car.car_type,
            registration_number: car.registration_number.clone(),
            price_per_day: car.price_per_day,
            price_per_hour: car.price_per_hour,
            available: car.available,
            description: car.description.clone(),
            image_url: car.image_url.clone(),
            average_rating: car.average_rating,
            total_reviews: car.total_reviews,
            rating_breakdown: car.rating_breakdown.clone(),
            created_at: car.created_at.map(|dt| dt.to_chrono()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_car_type_wire_names() {
        assert_eq!(serde_json::to_string(&CarType::Suv).unwrap(), "\"SUV\"");
        assert_eq!(serde_json::to_string(&CarType::Mpv).unwrap(), "\"MPV\"");
        assert_eq!(
            serde_json::to_string(&CarType::Sedan).unwrap(),
            "\"Sedan\""
        );
    }

    #[test]
    fn test_car_type_from_str() {
        assert_eq!(CarType::from_str("SUV"), Some(CarType::Suv));
        assert_eq!(CarType::from_str("Sports"), Some(CarType::Sports));
        assert_eq!(CarType::from_str("suv"), None);
        assert_eq!(CarType::from_str("Truck"), None);
    }

    #[test]
    fn test_rating_breakdown_wire_keys() {
        let breakdown = RatingBreakdown {
            one: 1,
            two: 0,
            three: 2,
            four: 0,
            five: 7,
        };
        let json = serde_json::to_value(&breakdown).unwrap();
        assert_eq!(json["1"], 1);
        assert_eq!(json["3"], 2);
        assert_eq!(json["5"], 7);
    }
}
