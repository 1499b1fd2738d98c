use actix_web::{web, HttpResponse};
use bson::{doc, oid::ObjectId, DateTime};
use chrono::{DateTime as ChronoDateTime, Utc};
use futures::TryStreamExt;
use log::info;
use mongodb::Client;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::collections;
use crate::errors::ApiError;
use crate::middleware::identity::Identity;
use crate::models::booking::{Booking, BookingResponse, BookingStatus, Location, RentalType};
use crate::models::car::{Car, CarResponse};
use crate::routes::parse_object_id;
use crate::services::availability::AvailabilityChecker;
use crate::services::lifecycle::BookingLifecycle;
use crate::services::pricing::PricingService;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub car_id: String,
    pub start_date: ChronoDateTime<Utc>,
    pub end_date: ChronoDateTime<Utc>,
    pub rental_type: String,
    pub duration: i32,
    pub pickup_location: Option<Location>,
    pub dropoff_location: Option<Location>,
}

/// POST /api/bookings. Validates the window, runs the availability gate,
/// quotes the price from the car's current rates and persists the
/// booking as `pending`. The car's availability flag is deliberately not
/// touched here; only confirmation locks the car.
pub async fn create_booking(
    data: web::Data<Arc<Client>>,
    config: web::Data<AppConfig>,
    identity: Identity,
    input: web::Json<CreateBookingRequest>,
) -> Result<HttpResponse, ApiError> {
    let client = data.into_inner();
    let input = input.into_inner();

    let rental_type = RentalType::from_str(&input.rental_type).ok_or_else(|| {
        ApiError::Validation("Rental type must be 'hours' or 'days'".to_string())
    })?;
    if input.duration < 1 {
        return Err(ApiError::Validation(
            "Duration must be at least 1".to_string(),
        ));
    }
    AvailabilityChecker::validate_window(input.start_date, input.end_date, Utc::now())?;

    let car_id = parse_object_id(&input.car_id, "car")?;
    let car = collections::cars(&client)
        .find_one(doc! { "_id": car_id })
        .await?
        .ok_or_else(|| ApiError::NotFound("Car not found".to_string()))?;

    let start = DateTime::from_chrono(input.start_date);
    let end = DateTime::from_chrono(input.end_date);
    AvailabilityChecker::ensure_bookable(&client, &car, car_id, start, end).await?;

    let total_price = PricingService::quote(rental_type, input.duration, &car);

    // Location snapshots default to the configured branch and are never
    // re-derived after creation.
    let branch = Location {
        address: config.branch_address.clone(),
        city: config.branch_city.clone(),
    };

    let now = DateTime::now();
    let mut booking = Booking {
        id: None,
        user_id: identity.user_id,
        car_id,
        start_date: start,
        end_date: end,
        rental_type,
        duration: input.duration,
        total_price,
        status: BookingStatus::Pending,
        pickup_location: input.pickup_location.unwrap_or_else(|| branch.clone()),
        dropoff_location: input.dropoff_location.unwrap_or(branch),
        has_review: false,
        admin_notes: None,
        created_at: Some(now),
        updated_at: Some(now),
    };

    let result = collections::bookings(&client).insert_one(&booking).await?;
    booking.id = result.inserted_id.as_object_id();

    info!(
        "Booking created for car {} by {} ({} {}, total {})",
        car_id.to_hex(),
        identity.email,
        booking.duration,
        rental_type.as_str(),
        total_price
    );

    let bookings = owned_bookings_with_cars(&client, identity.user_id).await?;

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Booking request submitted",
        "booking": BookingResponse::from(&booking).with_car(CarResponse::from(&car)),
        "bookings": bookings,
    })))
}

/// GET /api/bookings/my-bookings
pub async fn my_bookings(
    data: web::Data<Arc<Client>>,
    identity: Identity,
) -> Result<HttpResponse, ApiError> {
    let client = data.into_inner();
    let bookings = owned_bookings_with_cars(&client, identity.user_id).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "bookings": bookings,
    })))
}

/// PUT /api/bookings/{id}/cancel. Owner only, pending or confirmed.
pub async fn cancel_booking(
    data: web::Data<Arc<Client>>,
    identity: Identity,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let client = data.into_inner();
    let booking_id = parse_object_id(&path.into_inner(), "booking")?;

    let booking = BookingLifecycle::owner_transition(
        &client,
        booking_id,
        BookingStatus::Cancelled,
        identity.user_id,
    )
    .await?;

    let bookings = owned_bookings_with_cars(&client, identity.user_id).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Booking cancelled",
        "booking": BookingResponse::from(&booking),
        "bookings": bookings,
    })))
}

/// PUT /api/bookings/{id}/complete. Owner only, active rentals.
pub async fn complete_booking(
    data: web::Data<Arc<Client>>,
    identity: Identity,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let client = data.into_inner();
    let booking_id = parse_object_id(&path.into_inner(), "booking")?;

    let booking = BookingLifecycle::owner_transition(
        &client,
        booking_id,
        BookingStatus::Completed,
        identity.user_id,
    )
    .await?;

    let bookings = owned_bookings_with_cars(&client, identity.user_id).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Booking marked as completed",
        "booking": BookingResponse::from(&booking),
        "bookings": bookings,
    })))
}

/// The caller's bookings, newest first, each with its car attached. The
/// self-service endpoints return this refreshed list alongside the
/// mutated booking.
pub(crate) async fn owned_bookings_with_cars(
    client: &Client,
    user_id: ObjectId,
) -> Result<Vec<BookingResponse>, ApiError> {
    let bookings = collections::bookings(client)
        .find(doc! { "user_id": user_id })
        .sort(doc! { "created_at": -1 })
        .await?
        .try_collect::<Vec<Booking>>()
        .await?;

    let car_ids: Vec<ObjectId> = bookings.iter().map(|booking| booking.car_id).collect();
    let cars = collections::cars(client)
        .find(doc! { "_id": { "$in": car_ids } })
        .await?
        .try_collect::<Vec<Car>>()
        .await?;
    let cars_by_id: HashMap<ObjectId, &Car> = cars
        .iter()
        .filter_map(|car| car.id.map(|id| (id, car)))
        .collect();

    Ok(bookings
        .iter()
        .map(|booking| {
            let response = BookingResponse::from(booking);
            match cars_by_id.get(&booking.car_id) {
                Some(car) => response.with_car(CarResponse::from(*car)),
                None => response,
            }
        })
        .collect())
}
