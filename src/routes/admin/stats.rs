use actix_web::{web, HttpResponse};
use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::Client;
use serde_json::json;
use std::sync::Arc;

use crate::db::collections;
use crate::errors::ApiError;
use crate::middleware::identity::AdminIdentity;
use crate::models::booking::BookingStatus;

const ALL_STATUSES: [BookingStatus; 5] = [
    BookingStatus::Pending,
    BookingStatus::Confirmed,
    BookingStatus::Active,
    BookingStatus::Completed,
    BookingStatus::Cancelled,
];

/// GET /api/admin/stats. Dashboard counts, the booking status
/// breakdown, and revenue. Revenue counts bookings that were at least
/// confirmed; pending requests and cancellations contribute nothing.
pub async fn dashboard(
    data: web::Data<Arc<Client>>,
    _admin: AdminIdentity,
) -> Result<HttpResponse, ApiError> {
    let client = data.into_inner();

    let total_users = collections::users(&client)
        .count_documents(doc! { "is_active": true })
        .await?;
    let total_cars = collections::cars(&client).count_documents(doc! {}).await?;
    let available_cars = collections::cars(&client)
        .count_documents(doc! { "available": true })
        .await?;
    let total_bookings = collections::bookings(&client)
        .count_documents(doc! {})
        .await?;
    let total_reviews = collections::reviews(&client)
        .count_documents(doc! { "is_active": true })
        .await?;

    let pipeline = vec![doc! { "$group": {
        "_id": "$status",
        "count": { "$sum": 1 },
        "revenue": { "$sum": "$total_price" },
    } }];
    let groups = collections::bookings(&client)
        .aggregate(pipeline)
        .await?
        .try_collect::<Vec<Document>>()
        .await?;

    let mut by_status = json!({});
    for status in ALL_STATUSES {
        by_status[status.as_str()] = json!(0);
    }
    let mut total_revenue = 0.0;
    for group in &groups {
        let status = match group.get_str("_id").ok().and_then(BookingStatus::from_str) {
            Some(status) => status,
            None => continue,
        };
        let count = group
            .get_i32("count")
            .map(i64::from)
            .or_else(|_| group.get_i64("count"))
            .unwrap_or(0);
        by_status[status.as_str()] = json!(count);

        if status.occupies_car() || status == BookingStatus::Completed {
            total_revenue += group.get_f64("revenue").unwrap_or(0.0);
        }
    }

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "stats": {
            "totalUsers": total_users,
            "totalCars": total_cars,
            "availableCars": available_cars,
            "totalBookings": total_bookings,
            "totalReviews": total_reviews,
            "bookingsByStatus": by_status,
            "totalRevenue": total_revenue,
        },
    })))
}
