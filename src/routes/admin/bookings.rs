use actix_web::{web, HttpResponse};
use chrono::{DateTime as ChronoDateTime, Duration, NaiveDate, NaiveTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::Client;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

use crate::db::collections;
use crate::errors::ApiError;
use crate::middleware::identity::AdminIdentity;
use crate::models::booking::{Booking, BookingResponse, BookingStatus};
use crate::models::car::{Car, CarResponse};
use crate::models::user::{User, UserPublic};
use crate::routes::parse_object_id;
use crate::services::lifecycle::BookingLifecycle;

const DEFAULT_LIMIT: i64 = 100;
const MAX_LIMIT: i64 = 500;

#[derive(Debug, Deserialize)]
pub struct BookingListQuery {
    pub status: Option<String>,
    /// Calendar day (UTC) the booking starts on, `YYYY-MM-DD`.
    pub date: Option<String>,
    pub limit: Option<i64>,
}

/// GET /api/admin/bookings?status=&date=&limit=. Newest first, with
/// the owning user and the car attached to each entry.
pub async fn list_bookings(
    data: web::Data<Arc<Client>>,
    _admin: AdminIdentity,
    query: web::Query<BookingListQuery>,
) -> Result<HttpResponse, ApiError> {
    let client = data.into_inner();

    let mut filter = doc! {};
    if let Some(raw) = &query.status {
        let status = BookingStatus::from_str(raw)
            .ok_or_else(|| ApiError::Validation(format!("Invalid status filter: {}", raw)))?;
        filter.insert("status", status.as_str());
    }
    if let Some(raw) = &query.date {
        filter.insert("start_date", day_range(raw)?);
    }
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    let bookings = collections::bookings(&client)
        .find(filter)
        .sort(doc! { "created_at": -1 })
        .limit(limit)
        .await?
        .try_collect::<Vec<Booking>>()
        .await?;

    let car_ids: Vec<ObjectId> = bookings.iter().map(|booking| booking.car_id).collect();
    let user_ids: Vec<ObjectId> = bookings.iter().map(|booking| booking.user_id).collect();

    let cars = collections::cars(&client)
        .find(doc! { "_id": { "$in": car_ids } })
        .await?
        .try_collect::<Vec<Car>>()
        .await?;
    let users = collections::users(&client)
        .find(doc! { "_id": { "$in": user_ids } })
        .await?
        .try_collect::<Vec<User>>()
        .await?;

    let cars_by_id: HashMap<ObjectId, &Car> = cars
        .iter()
        .filter_map(|car| car.id.map(|id| (id, car)))
        .collect();
    let users_by_id: HashMap<ObjectId, &User> = users
        .iter()
        .filter_map(|user| user.id.map(|id| (id, user)))
        .collect();

    let bookings: Vec<BookingResponse> = bookings
        .iter()
        .map(|booking| {
            let mut response = BookingResponse::from(booking);
            if let Some(car) = cars_by_id.get(&booking.car_id) {
                response = response.with_car(CarResponse::from(*car));
            }
            if let Some(user) = users_by_id.get(&booking.user_id) {
                response = response.with_user(UserPublic::from(*user));
            }
            response
        })
        .collect();

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "count": bookings.len(),
        "bookings": bookings,
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetStatusRequest {
    pub status: String,
    pub admin_notes: Option<String>,
}

/// PUT /api/admin/bookings/{id}/status. Drives the booking through
/// the transition table as the admin actor; illegal moves come back
/// as conflicts.
pub async fn set_status(
    data: web::Data<Arc<Client>>,
    _admin: AdminIdentity,
    path: web::Path<String>,
    input: web::Json<SetStatusRequest>,
) -> Result<HttpResponse, ApiError> {
    let client = data.into_inner();
    let input = input.into_inner();
    let booking_id = parse_object_id(&path.into_inner(), "booking")?;

    let to = BookingStatus::from_str(&input.status)
        .ok_or_else(|| ApiError::Validation(format!("Invalid booking status: {}", input.status)))?;

    let booking =
        BookingLifecycle::admin_set_status(&client, booking_id, to, input.admin_notes).await?;

    let mut response = BookingResponse::from(&booking);
    if let Some(car) = collections::cars(&client)
        .find_one(doc! { "_id": booking.car_id })
        .await?
    {
        response = response.with_car(CarResponse::from(&car));
    }
    if let Some(user) = collections::users(&client)
        .find_one(doc! { "_id": booking.user_id })
        .await?
    {
        response = response.with_user(UserPublic::from(&user));
    }

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": format!("Booking status updated to {}", to.as_str()),
        "booking": response,
    })))
}

/// `[00:00, 00:00 + 1d)` range over the given UTC calendar day.
fn day_range(raw: &str) -> Result<Document, ApiError> {
    let day = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| ApiError::Validation("Date filter must be formatted YYYY-MM-DD".to_string()))?;
    let start = ChronoDateTime::<Utc>::from_naive_utc_and_offset(day.and_time(NaiveTime::MIN), Utc);
    let end = start + Duration::days(1);

    Ok(doc! {
        "$gte": DateTime::from_chrono(start),
        "$lt": DateTime::from_chrono(end),
    })
}
