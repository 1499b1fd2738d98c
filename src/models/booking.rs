use chrono::{DateTime as ChronoDateTime, Utc};
use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

use crate::models::car::CarResponse;
use crate::models::user::UserPublic;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Active,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Active => "active",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(BookingStatus::Pending),
            "confirmed" => Some(BookingStatus::Confirmed),
            "active" => Some(BookingStatus::Active),
            "completed" => Some(BookingStatus::Completed),
            "cancelled" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }

    /// Confirmed and active bookings hold the car; pending ones are
    /// requests and never block other requests.
    pub fn occupies_car(&self) -> bool {
        matches!(self, BookingStatus::Confirmed | BookingStatus::Active)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RentalType {
    Hours,
    Days,
}

impl RentalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RentalType::Hours => "hours",
            RentalType::Days => "days",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "hours" => Some(RentalType::Hours),
            "days" => Some(RentalType::Days),
            _ => None,
        }
    }
}

/// Who is driving a status change. The two paths carry different
/// car-availability side effects for the same `(from, to)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Owner,
    Admin,
}

/// What a transition does to the cached `car.available` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvailabilityEffect {
    /// Flag untouched.
    None,
    /// Car leaves general availability (`available = false`).
    Hold,
    /// Car returns to general availability (`available = true`).
    Release,
}

/// The whole lifecycle in one table. Any `(from, to, actor)` triple not
/// listed here is rejected; `completed` and `cancelled` are terminal for
/// every actor. Owner rows always release the car; admin rows touch the
/// flag only on confirm and on cancel-after-confirm.
pub fn transition(
    from: BookingStatus,
    to: BookingStatus,
    actor: Actor,
) -> Option<AvailabilityEffect> {
    use AvailabilityEffect::*;
    use BookingStatus::*;

    match (from, to, actor) {
        (Pending, Confirmed, Actor::Admin) => Some(Hold),
        (Pending, Cancelled, Actor::Admin) => Some(None),
        (Confirmed, Active, Actor::Admin) => Some(None),
        (Confirmed, Cancelled, Actor::Admin) => Some(Release),
        (Active, Completed, Actor::Admin) => Some(None),
        (Pending, Cancelled, Actor::Owner) => Some(Release),
        (Confirmed, Cancelled, Actor::Owner) => Some(Release),
        (Active, Completed, Actor::Owner) => Some(Release),
        _ => Option::None,
    }
}

/// Free-form address snapshot copied onto the booking at creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Location {
    pub address: String,
    pub city: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Booking {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: ObjectId,
    pub car_id: ObjectId,
    pub start_date: DateTime,
    pub end_date: DateTime,
    pub rental_type: RentalType,
    pub duration: i32,
    /// Quoted once at creation from the car rates of that moment; later
    /// price edits on the car never touch existing bookings.
    pub total_price: f64,
    pub status: BookingStatus,
    pub pickup_location: Location,
    pub dropoff_location: Location,
    #[serde(default)]
    pub has_review: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_notes: Option<String>,
    pub created_at: Option<DateTime>,
    pub updated_at: Option<DateTime>,
}

impl Booking {
    /// The interval test the source ran against the store:
    /// `existing.start <= requested_end && existing.end >= requested_start`.
    /// Inclusive on both ends, so windows that merely touch count as a
    /// conflict.
    pub fn overlaps(&self, requested_start: DateTime, requested_end: DateTime) -> bool {
        self.start_date <= requested_end && self.end_date >= requested_start
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    pub id: String,
    pub user_id: String,
    pub car_id: String,
    pub start_date: ChronoDateTime<Utc>,
    pub end_date: ChronoDateTime<Utc>,
    pub rental_type: RentalType,
    pub duration: i32,
    pub total_price: f64,
    pub status: BookingStatus,
    pub pickup_location: Location,
    pub dropoff_location: Location,
    pub has_review: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<ChronoDateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub car: Option<CarResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserPublic>,
}

impl From<&Booking> for BookingResponse {
    fn from(booking: &Booking) -> Self {
        BookingResponse {
            id: booking.id.map(|id| id.to_hex()).unwrap_or_default(),
            user_id: booking.user_id.to_hex(),
            car_id: booking.car_id.to_hex(),
            start_date: booking.start_date.to_chrono(),
            end_date: booking.end_date.to_chrono(),
            rental_type: booking.rental_type,
            duration: booking.duration,
            total_price: booking.total_price,
            status: booking.status,
            pickup_location: booking.pickup_location.clone(),
            dropoff_location: booking.dropoff_location.clone(),
            has_review: booking.has_review,
            admin_notes: booking.admin_notes.clone(),
            created_at: booking.created_at.map(|dt| dt.to_chrono()),
            car: Option::None,
            user: Option::None,
        }
    }
}

impl BookingResponse {
    pub fn with_car(mut self, car: CarResponse) -> Self {
        self.car = Some(car);
        self
    }

    pub fn with_user(mut self, user: UserPublic) -> Self {
        self.user = Some(user);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use AvailabilityEffect as Effect;
    use BookingStatus::*;

    fn booking_between(start_ms: i64, end_ms: i64, status: BookingStatus) -> Booking {
        Booking {
            id: Some(ObjectId::new()),
            user_id: ObjectId::new(),
            car_id: ObjectId::new(),
            start_date: DateTime::from_millis(start_ms),
            end_date: DateTime::from_millis(end_ms),
            rental_type: RentalType::Days,
            duration: 1,
            total_price: 1000.0,
            status,
            pickup_location: Location {
                address: "128 Lakeview Drive".to_string(),
                city: "Austin".to_string(),
            },
            dropoff_location: Location {
                address: "128 Lakeview Drive".to_string(),
                city: "Austin".to_string(),
            },
            has_review: false,
            admin_notes: Option::None,
            created_at: Some(DateTime::now()),
            updated_at: Some(DateTime::now()),
        }
    }

    #[test]
    fn test_admin_transitions_allowed() {
        assert_eq!(
            transition(Pending, Confirmed, Actor::Admin),
            Some(Effect::Hold)
        );
        assert_eq!(
            transition(Pending, Cancelled, Actor::Admin),
            Some(Effect::None)
        );
        assert_eq!(
            transition(Confirmed, Active, Actor::Admin),
            Some(Effect::None)
        );
        assert_eq!(
            transition(Confirmed, Cancelled, Actor::Admin),
            Some(Effect::Release)
        );
        assert_eq!(
            transition(Active, Completed, Actor::Admin),
            Some(Effect::None)
        );
    }

    #[test]
    fn test_owner_transitions_always_release() {
        assert_eq!(
            transition(Pending, Cancelled, Actor::Owner),
            Some(Effect::Release)
        );
        assert_eq!(
            transition(Confirmed, Cancelled, Actor::Owner),
            Some(Effect::Release)
        );
        assert_eq!(
            transition(Active, Completed, Actor::Owner),
            Some(Effect::Release)
        );
    }

    #[test]
    fn test_owner_cannot_confirm_or_activate() {
        assert_eq!(transition(Pending, Confirmed, Actor::Owner), None);
        assert_eq!(transition(Confirmed, Active, Actor::Owner), None);
    }

    #[test]
    fn test_terminal_states_reject_everything() {
        for actor in [Actor::Admin, Actor::Owner] {
            for to in [Pending, Confirmed, Active, Completed, Cancelled] {
                assert_eq!(transition(Completed, to, actor), None);
                assert_eq!(transition(Cancelled, to, actor), None);
            }
        }
    }

    #[test]
    fn test_no_skipping_states() {
        assert_eq!(transition(Pending, Active, Actor::Admin), None);
        assert_eq!(transition(Pending, Completed, Actor::Admin), None);
        assert_eq!(transition(Confirmed, Completed, Actor::Admin), None);
        assert_eq!(transition(Active, Cancelled, Actor::Admin), None);
        assert_eq!(transition(Active, Cancelled, Actor::Owner), None);
    }

    #[test]
    fn test_self_transition_rejected() {
        for status in [Pending, Confirmed, Active, Completed, Cancelled] {
            assert_eq!(transition(status, status, Actor::Admin), None);
        }
    }

    #[test]
    fn test_occupies_car() {
        assert!(Confirmed.occupies_car());
        assert!(Active.occupies_car());
        assert!(!Pending.occupies_car());
        assert!(!Completed.occupies_car());
        assert!(!Cancelled.occupies_car());
    }

    #[test]
    fn test_overlap_partial_and_contained() {
        let existing = booking_between(1_000, 5_000, Confirmed);
        // Partial overlap on either side
        assert!(existing.overlaps(DateTime::from_millis(4_000), DateTime::from_millis(9_000)));
        assert!(existing.overlaps(DateTime::from_millis(0), DateTime::from_millis(2_000)));
        // Requested window fully inside the existing one, and vice versa
        assert!(existing.overlaps(DateTime::from_millis(2_000), DateTime::from_millis(3_000)));
        assert!(existing.overlaps(DateTime::from_millis(0), DateTime::from_millis(9_000)));
    }

    #[test]
    fn test_overlap_touching_windows_conflict() {
        // The inclusive test treats shared endpoints as a conflict.
        let existing = booking_between(1_000, 5_000, Confirmed);
        assert!(existing.overlaps(DateTime::from_millis(5_000), DateTime::from_millis(9_000)));
        assert!(existing.overlaps(DateTime::from_millis(0), DateTime::from_millis(1_000)));
    }

    #[test]
    fn test_overlap_disjoint_windows() {
        let existing = booking_between(1_000, 5_000, Confirmed);
        assert!(!existing.overlaps(DateTime::from_millis(5_001), DateTime::from_millis(9_000)));
        assert!(!existing.overlaps(DateTime::from_millis(0), DateTime::from_millis(999)));
    }

    #[test]
    fn test_status_round_trip() {
        for status in [Pending, Confirmed, Active, Completed, Cancelled] {
            assert_eq!(BookingStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(BookingStatus::from_str("unknown"), None);
        assert_eq!(BookingStatus::from_str("Pending"), None);
    }

    #[test]
    fn test_rental_type_round_trip() {
        assert_eq!(RentalType::from_str("hours"), Some(RentalType::Hours));
        assert_eq!(RentalType::from_str("days"), Some(RentalType::Days));
        assert_eq!(RentalType::from_str("weeks"), None);
    }
}
