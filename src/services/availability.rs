use chrono::{DateTime as ChronoDateTime, Utc};
use mongodb::bson::{doc, oid::ObjectId, DateTime};
use mongodb::Client;
use futures::TryStreamExt;

use crate::db::collections;
use crate::errors::ApiError;
use crate::models::booking::{Booking, BookingStatus};
use crate::models::car::Car;

pub struct AvailabilityChecker;

impl AvailabilityChecker {
    /// Creation-time window rules: the end must come strictly after the
    /// start and the start must not already be in the past.
    pub fn validate_window(
        start: ChronoDateTime<Utc>,
        end: ChronoDateTime<Utc>,
        now: ChronoDateTime<Utc>,
    ) -> Result<(), ApiError> {
        if end <= start {
            return Err(ApiError::Validation(
                "End date must be after start date".to_string(),
            ));
        }
        if start < now {
            return Err(ApiError::Validation(
                "Start date cannot be in the past".to_string(),
            ));
        }
        Ok(())
    }

    /// First booking in `candidates` that currently holds the car and
    /// overlaps the requested window. Pending, completed and cancelled
    /// bookings never count.
    pub fn find_conflict<'a>(
        candidates: &'a [Booking],
        start: DateTime,
        end: DateTime,
    ) -> Option<&'a Booking> {
        candidates
            .iter()
            .filter(|booking| booking.status.occupies_car())
            .find(|booking| booking.overlaps(start, end))
    }

    /// The cached `available` flag rejects regardless of dates.
    pub fn ensure_car_available(car: &Car) -> Result<(), ApiError> {
        if !car.available {
            return Err(ApiError::Conflict(
                "Car is not available for booking".to_string(),
            ));
        }
        Ok(())
    }

    /// The full gate run before a booking is created: the flag first,
    /// then the window against confirmed/active bookings on the car.
    pub async fn ensure_bookable(
        client: &Client,
        car: &Car,
        car_id: ObjectId,
        start: DateTime,
        end: DateTime,
    ) -> Result<(), ApiError> {
        Self::ensure_car_available(car)?;

        let occupying = collections::bookings(client)
            .find(doc! {
                "car_id": car_id,
                "status": { "$in": [
                    BookingStatus::Confirmed.as_str(),
                    BookingStatus::Active.as_str(),
                ] },
            })
            .await?
            .try_collect::<Vec<Booking>>()
            .await?;

        if Self::find_conflict(&occupying, start, end).is_some() {
            return Err(ApiError::Conflict(
                "Car is already booked for the selected dates".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::booking::{Location, RentalType};
    use crate::models::car::{CarType, RatingBreakdown};
    use chrono::Duration;

    fn car_with_flag(available: bool) -> Car {
        Car {
            id: Some(ObjectId::new()),
            make: "Honda".to_string(),
            model: "City".to_string(),
            year: 2023,
            car_type: CarType::Sedan,
            registration_number: None,
            price_per_day: 1000.0,
            price_per_hour: 90.0,
            available,
            description: None,
            image_url: None,
            average_rating: 0.0,
            total_reviews: 0,
            rating_breakdown: RatingBreakdown::default(),
            created_at: None,
            updated_at: None,
        }
    }

    fn booking_with(status: BookingStatus, start_ms: i64, end_ms: i64) -> Booking {
        Booking {
            id: Some(ObjectId::new()),
            user_id: ObjectId::new(),
            car_id: ObjectId::new(),
            start_date: DateTime::from_millis(start_ms),
            end_date: DateTime::from_millis(end_ms),
            rental_type: RentalType::Days,
            duration: 1,
            total_price: 500.0,
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
            admin_notes: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_window_end_must_follow_start() {
        let now = Utc::now();
        let start = now + Duration::days(1);

        assert!(AvailabilityChecker::validate_window(start, start, now).is_err());
        assert!(
            AvailabilityChecker::validate_window(start, start - Duration::hours(1), now).is_err()
        );
        assert!(
            AvailabilityChecker::validate_window(start, start + Duration::hours(1), now).is_ok()
        );
    }

    #[test]
    fn test_window_cannot_start_in_the_past() {
        let now = Utc::now();
        let yesterday = now - Duration::days(1);

        let err = AvailabilityChecker::validate_window(yesterday, now + Duration::days(1), now)
            .unwrap_err();
        assert!(err.to_string().contains("past"));
    }

    #[test]
    fn test_unavailable_car_is_rejected() {
        let err = AvailabilityChecker::ensure_car_available(&car_with_flag(false)).unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
        assert_eq!(err.to_string(), "Car is not available for booking");
    }

    #[test]
    fn test_available_car_passes_flag_gate() {
        assert!(AvailabilityChecker::ensure_car_available(&car_with_flag(true)).is_ok());
    }

    #[test]
    fn test_conflict_found_for_confirmed_overlap() {
        let candidates = vec![booking_with(BookingStatus::Confirmed, 1_000, 5_000)];
        let conflict = AvailabilityChecker::find_conflict(
            &candidates,
            DateTime::from_millis(4_000),
            DateTime::from_millis(8_000),
        );
        assert!(conflict.is_some());
    }

    #[test]
    fn test_conflict_found_for_active_overlap() {
        let candidates = vec![booking_with(BookingStatus::Active, 1_000, 5_000)];
        assert!(AvailabilityChecker::find_conflict(
            &candidates,
            DateTime::from_millis(2_000),
            DateTime::from_millis(3_000),
        )
        .is_some());
    }

    #[test]
    fn test_pending_bookings_do_not_conflict() {
        // Multiple users may hold pending requests for the same window;
        // only confirmation locks the car.
        let candidates = vec![
            booking_with(BookingStatus::Pending, 1_000, 5_000),
            booking_with(BookingStatus::Pending, 2_000, 6_000),
        ];
        assert!(AvailabilityChecker::find_conflict(
            &candidates,
            DateTime::from_millis(1_500),
            DateTime::from_millis(4_500),
        )
        .is_none());
    }

    #[test]
    fn test_finished_bookings_do_not_conflict() {
        let candidates = vec![
            booking_with(BookingStatus::Completed, 1_000, 5_000),
            booking_with(BookingStatus::Cancelled, 1_000, 5_000),
        ];
        assert!(AvailabilityChecker::find_conflict(
            &candidates,
            DateTime::from_millis(1_000),
            DateTime::from_millis(5_000),
        )
        .is_none());
    }

    #[test]
    fn test_disjoint_window_is_free() {
        let candidates = vec![booking_with(BookingStatus::Confirmed, 1_000, 5_000)];
        assert!(AvailabilityChecker::find_conflict(
            &candidates,
            DateTime::from_millis(6_000),
            DateTime::from_millis(9_000),
        )
        .is_none());
    }
}
