use actix_web::{web, HttpResponse};
use log::info;
use mongodb::bson::{doc, DateTime};
use mongodb::Client;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::db::collections;
use crate::errors::ApiError;
use crate::middleware::identity::Identity;
use crate::models::review::{Review, ReviewKind, ReviewResponse};
use crate::routes::parse_object_id;
use crate::services::reviews::ReviewService;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewRequest {
    #[serde(rename = "type")]
    pub kind: String,
    pub car_id: Option<String>,
    pub booking_id: Option<String>,
    pub rating: i32,
    pub comment: String,
}

/// POST /api/reviews. A `car` review must reference one of the caller's
/// completed, not-yet-reviewed bookings; it flips `has_review` on that
/// booking and rebuilds the car's rating aggregates. A `service` review
/// is plain feedback with no references.
pub async fn create_review(
    data: web::Data<Arc<Client>>,
    identity: Identity,
    input: web::Json<CreateReviewRequest>,
) -> Result<HttpResponse, ApiError> {
    let client = data.into_inner();
    let input = input.into_inner();

    let kind = ReviewKind::from_str(&input.kind)
        .ok_or_else(|| ApiError::Validation("Review type must be 'car' or 'service'".to_string()))?;
    if !(1..=5).contains(&input.rating) {
        return Err(ApiError::Validation(
            "Rating must be between 1 and 5".to_string(),
        ));
    }
    let comment = input.comment.trim();
    if comment.is_empty() {
        return Err(ApiError::Validation("Comment is required".to_string()));
    }

    // For car reviews, resolve and gate the booking reference up front.
    let car_ref = match kind {
        ReviewKind::Car => {
            let car_id = input
                .car_id
                .as_deref()
                .ok_or_else(|| ApiError::Validation("Car reviews require carId".to_string()))
                .and_then(|raw| parse_object_id(raw, "car"))?;
            let booking_id = input
                .booking_id
                .as_deref()
                .ok_or_else(|| ApiError::Validation("Car reviews require bookingId".to_string()))
                .and_then(|raw| parse_object_id(raw, "booking"))?;

            let booking = collections::bookings(&client)
                .find_one(doc! { "_id": booking_id })
                .await?
                .ok_or_else(|| ApiError::NotFound("Booking not found".to_string()))?;
            if booking.car_id != car_id {
                return Err(ApiError::Validation(
                    "Booking does not reference this car".to_string(),
                ));
            }
            ReviewService::ensure_car_review_allowed(&booking, identity.user_id)?;

            Some((car_id, booking_id))
        }
        ReviewKind::Service => None,
    };

    let now = DateTime::now();
    let mut review = Review {
        id: None,
        user_id: identity.user_id,
        kind,
        car_id: car_ref.map(|(car_id, _)| car_id),
        booking_id: car_ref.map(|(_, booking_id)| booking_id),
        rating: input.rating,
        comment: comment.to_string(),
        is_active: true,
        created_at: Some(now),
        updated_at: Some(now),
    };

    let result = collections::reviews(&client).insert_one(&review).await?;
    review.id = result.inserted_id.as_object_id();

    if let Some((car_id, booking_id)) = car_ref {
        collections::bookings(&client)
            .update_one(
                doc! { "_id": booking_id },
                doc! { "$set": { "has_review": true, "updated_at": now } },
            )
            .await?;
        ReviewService::recompute_car_aggregates(&client, car_id).await?;
        info!(
            "Car review ({} stars) recorded for car {} by {}",
            review.rating,
            car_id.to_hex(),
            identity.email
        );
    }

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Review submitted",
        "review": ReviewResponse::from(&review),
    })))
}
