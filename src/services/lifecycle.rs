use log::info;
use mongodb::bson::{doc, oid::ObjectId, DateTime};
use mongodb::Client;

use crate::db::collections;
use crate::errors::ApiError;
use crate::models::booking::{transition, Actor, AvailabilityEffect, Booking, BookingStatus};

/// Every status change funnels through here: the transition table
/// decides whether a move is legal and what happens to the car's
/// availability flag, and the two writes (booking, then car) happen
/// nowhere else. No multi-document transaction; a failure between the
/// writes can leave the flag stale.
pub struct BookingLifecycle;

impl BookingLifecycle {
    /// Admin path: any booking, any table-approved target status,
    /// optional annotation.
    pub async fn admin_set_status(
        client: &Client,
        booking_id: ObjectId,
        to: BookingStatus,
        admin_notes: Option<String>,
    ) -> Result<Booking, ApiError> {
        Self::apply(client, booking_id, to, Actor::Admin, None, admin_notes).await
    }

    /// Self-service path: the requesting user must own the booking.
    pub async fn owner_transition(
        client: &Client,
        booking_id: ObjectId,
        to: BookingStatus,
        user_id: ObjectId,
    ) -> Result<Booking, ApiError> {
        Self::apply(client, booking_id, to, Actor::Owner, Some(user_id), None).await
    }

    async fn apply(
        client: &Client,
        booking_id: ObjectId,
        to: BookingStatus,
        actor: Actor,
        requester: Option<ObjectId>,
        admin_notes: Option<String>,
    ) -> Result<Booking, ApiError> {
        let bookings = collections::bookings(client);

        let mut booking = bookings
            .find_one(doc! { "_id": booking_id })
            .await?
            .ok_or_else(|| ApiError::NotFound("Booking not found".to_string()))?;

        ensure_owner(&booking, requester)?;

        let effect = transition(booking.status, to, actor)
            .ok_or_else(|| ApiError::Conflict(rejection_message(booking.status, to, actor)))?;

        let now = DateTime::now();
        let mut update = doc! {
            "status": to.as_str(),
            "updated_at": now,
        };
        if let Some(notes) = &admin_notes {
            update.insert("admin_notes", notes.clone());
        }

        bookings
            .update_one(doc! { "_id": booking_id }, doc! { "$set": update })
            .await?;

        // Second, independent write; a failure here leaves the flag
        // stale until a later transition touches it.
        if let Some(available) = match effect {
            AvailabilityEffect::Hold => Some(false),
            AvailabilityEffect::Release => Some(true),
            AvailabilityEffect::None => None,
        } {
            collections::cars(client)
                .update_one(
                    doc! { "_id": booking.car_id },
                    doc! { "$set": { "available": available, "updated_at": now } },
                )
                .await?;
        }

        info!(
            "Booking {} moved {} -> {}",
            booking_id.to_hex(),
            booking.status.as_str(),
            to.as_str()
        );

        booking.status = to;
        booking.updated_at = Some(now);
        if admin_notes.is_some() {
            booking.admin_notes = admin_notes;
        }
        Ok(booking)
    }
}

/// Owner paths pass the requesting user's id; the admin path passes
/// `None` and may act on any booking.
fn ensure_owner(booking: &Booking, requester: Option<ObjectId>) -> Result<(), ApiError> {
    if let Some(requester) = requester {
        if booking.user_id != requester {
            return Err(ApiError::Forbidden(
                "You do not have permission to modify this booking".to_string(),
            ));
        }
    }
    Ok(())
}

fn rejection_message(from: BookingStatus, to: BookingStatus, actor: Actor) -> String {
    match (actor, to) {
        (Actor::Owner, BookingStatus::Cancelled) => {
            "Only pending or confirmed bookings can be cancelled".to_string()
        }
        (Actor::Owner, BookingStatus::Completed) => {
            "Only active bookings can be completed".to_string()
        }
        _ => format!(
            "Cannot change booking status from {} to {}",
            from.as_str(),
            to.as_str()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::booking::{AvailabilityEffect as Effect, Location, RentalType};
    use crate::models::car::{Car, CarType, RatingBreakdown};
    use crate::services::availability::AvailabilityChecker;
    use crate::services::pricing::PricingService;
    use BookingStatus::*;

    fn booking_owned_by(user_id: ObjectId) -> Booking {
        Booking {
            id: Some(ObjectId::new()),
            user_id,
            car_id: ObjectId::new(),
            start_date: DateTime::from_millis(86_400_000),
            end_date: DateTime::from_millis(2 * 86_400_000),
            rental_type: RentalType::Days,
            duration: 1,
            total_price: 1000.0,
            status: Pending,
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
    fn test_ownership_check_rejects_foreign_booking() {
        let booking = booking_owned_by(ObjectId::new());
        let err = ensure_owner(&booking, Some(ObjectId::new())).unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[test]
    fn test_ownership_check_passes_owner_and_admin() {
        let owner = ObjectId::new();
        let booking = booking_owned_by(owner);
        assert!(ensure_owner(&booking, Some(owner)).is_ok());
        // Admin requests carry no requester id and skip the check.
        assert!(ensure_owner(&booking, None).is_ok());
    }

    #[test]
    fn test_owner_rejection_messages() {
        let cancel = rejection_message(Completed, Cancelled, Actor::Owner);
        assert_eq!(cancel, "Only pending or confirmed bookings can be cancelled");

        let complete = rejection_message(Pending, Completed, Actor::Owner);
        assert_eq!(complete, "Only active bookings can be completed");
    }

    #[test]
    fn test_admin_rejection_message_names_both_states() {
        let msg = rejection_message(Completed, Confirmed, Actor::Admin);
        assert!(msg.contains("completed"));
        assert!(msg.contains("confirmed"));
    }

    // The end-to-end scenario from the product walkthrough, exercised at
    // the level of the pure decision functions: quote, confirm, reject a
    // second request, cancel, accept the retry.
    #[test]
    fn test_booking_flow_scenario() {
        let car = Car {
            id: Some(ObjectId::new()),
            make: "Honda".to_string(),
            model: "CR-V".to_string(),
            year: 2023,
            car_type: CarType::Suv,
            registration_number: None,
            price_per_day: 1000.0,
            price_per_hour: 90.0,
            available: true,
            description: None,
            image_url: None,
            average_rating: 0.0,
            total_reviews: 0,
            rating_breakdown: RatingBreakdown::default(),
            created_at: None,
            updated_at: None,
        };

        // User A books two days.
        let total = PricingService::quote(RentalType::Days, 2, &car);
        assert_eq!(total, 2000.0);

        let day = 86_400_000i64;
        let booking = Booking {
            id: Some(ObjectId::new()),
            user_id: ObjectId::new(),
            car_id: car.id.unwrap(),
            start_date: DateTime::from_millis(day),
            end_date: DateTime::from_millis(3 * day),
            rental_type: RentalType::Days,
            duration: 2,
            total_price: total,
            status: Pending,
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
        };

        // While pending, an overlapping request sees no conflict.
        let held = vec![booking];
        assert!(AvailabilityChecker::find_conflict(
            &held,
            DateTime::from_millis(2 * day),
            DateTime::from_millis(4 * day),
        )
        .is_none());

        // Admin confirms: the car is held.
        assert_eq!(
            transition(Pending, Confirmed, Actor::Admin),
            Some(Effect::Hold)
        );
        let mut held = held;
        held[0].status = Confirmed;

        // User B's overlapping request now conflicts.
        assert!(AvailabilityChecker::find_conflict(
            &held,
            DateTime::from_millis(2 * day),
            DateTime::from_millis(4 * day),
        )
        .is_some());

        // User A cancels: the car is released.
        assert_eq!(
            transition(Confirmed, Cancelled, Actor::Owner),
            Some(Effect::Release)
        );
        held[0].status = Cancelled;

        // The identical request succeeds afterwards.
        assert!(AvailabilityChecker::find_conflict(
            &held,
            DateTime::from_millis(2 * day),
            DateTime::from_millis(4 * day),
        )
        .is_none());
    }
}
