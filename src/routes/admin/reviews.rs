use actix_web::{web, HttpResponse};
use bson::{doc, DateTime};
use log::info;
use mongodb::Client;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::db::collections;
use crate::errors::ApiError;
use crate::middleware::identity::AdminIdentity;
use crate::routes::parse_object_id;
use crate::services::reviews::ReviewService;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerateReviewRequest {
    pub is_active: bool,
}

/// PUT /api/admin/reviews/{id}. Show/hide a review. Hiding a car
/// review pulls it out of the car's aggregates right away, but the
/// booking keeps `has_review`, so the renter cannot file a replacement.
pub async fn moderate_review(
    data: web::Data<Arc<Client>>,
    _admin: AdminIdentity,
    path: web::Path<String>,
    input: web::Json<ModerateReviewRequest>,
) -> Result<HttpResponse, ApiError> {
    let client = data.into_inner();
    let review_id = parse_object_id(&path.into_inner(), "review")?;

    let reviews = collections::reviews(&client);
    let review = reviews
        .find_one(doc! { "_id": review_id })
        .await?
        .ok_or_else(|| ApiError::NotFound("Review not found".to_string()))?;

    reviews
        .update_one(
            doc! { "_id": review_id },
            doc! { "$set": {
                "is_active": input.is_active,
                "updated_at": DateTime::now(),
            } },
        )
        .await?;

    if let Some(car_id) = review.car_id {
        ReviewService::recompute_car_aggregates(&client, car_id).await?;
    }

    info!(
        "Review {} {}",
        review_id.to_hex(),
        if input.is_active { "restored" } else { "hidden" }
    );

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": if input.is_active { "Review restored" } else { "Review hidden" },
    })))
}

/// DELETE /api/admin/reviews/{id}. The exact inverse of creation: the
/// referenced booking becomes reviewable again and the car aggregates
/// are rebuilt without this review.
pub async fn delete_review(
    data: web::Data<Arc<Client>>,
    _admin: AdminIdentity,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let client = data.into_inner();
    let review_id = parse_object_id(&path.into_inner(), "review")?;

    let reviews = collections::reviews(&client);
    let review = reviews
        .find_one(doc! { "_id": review_id })
        .await?
        .ok_or_else(|| ApiError::NotFound("Review not found".to_string()))?;

    reviews.delete_one(doc! { "_id": review_id }).await?;

    if let Some(booking_id) = review.booking_id {
        collections::bookings(&client)
            .update_one(
                doc! { "_id": booking_id },
                doc! { "$set": { "has_review": false, "updated_at": DateTime::now() } },
            )
            .await?;
    }
    if let Some(car_id) = review.car_id {
        ReviewService::recompute_car_aggregates(&client, car_id).await?;
    }

    info!("Review {} deleted", review_id.to_hex());

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Review deleted",
    })))
}
