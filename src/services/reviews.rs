use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, DateTime};
use mongodb::Client;

use crate::db::collections;
use crate::errors::ApiError;
use crate::models::booking::{Booking, BookingStatus};
use crate::models::car::RatingBreakdown;

pub struct ReviewService;

impl ReviewService {
    /// Gate for car reviews: the caller must own the booking, the rental
    /// must be completed, and the booking must not have been reviewed yet.
    pub fn ensure_car_review_allowed(
        booking: &Booking,
        user_id: ObjectId,
    ) -> Result<(), ApiError> {
        if booking.user_id != user_id {
            return Err(ApiError::Forbidden(
                "You can only review your own bookings".to_string(),
            ));
        }
        if booking.status != BookingStatus::Completed {
            return Err(ApiError::Conflict(
                "Only completed bookings can be reviewed".to_string(),
            ));
        }
        if booking.has_review {
            return Err(ApiError::Conflict(
                "This booking has already been reviewed".to_string(),
            ));
        }
        Ok(())
    }

    /// Average (one decimal place), count, and per-star histogram for a
    /// set of ratings. Values outside 1..=5 can only come from
    /// out-of-band writes; they are dropped, not counted.
    pub fn summarize(ratings: &[i32]) -> (f64, i64, RatingBreakdown) {
        let mut breakdown = RatingBreakdown::default();
        let mut total = 0i64;
        let mut sum = 0i32;
        for rating in ratings {
            match rating {
                1 => breakdown.one += 1,
                2 => breakdown.two += 1,
                3 => breakdown.three += 1,
                4 => breakdown.four += 1,
                5 => breakdown.five += 1,
                _ => continue,
            }
            total += 1;
            sum += rating;
        }

        let average = if total == 0 {
            0.0
        } else {
            (f64::from(sum) / total as f64 * 10.0).round() / 10.0
        };

        (average, total, breakdown)
    }

    /// Rebuilds a car's rating aggregates from its active car reviews.
    /// Runs after every review write that touches the car, so hidden and
    /// deleted reviews drop out of the numbers immediately.
    pub async fn recompute_car_aggregates(
        client: &Client,
        car_id: ObjectId,
    ) -> Result<(), ApiError> {
        let ratings: Vec<i32> = collections::reviews(client)
            .find(doc! { "car_id": car_id, "kind": "car", "is_active": true })
            .await?
            .try_collect::<Vec<_>>()
            .await?
            .into_iter()
            .map(|review| review.rating)
            .collect();

        let (average, total, breakdown) = Self::summarize(&ratings);

        collections::cars(client)
            .update_one(
                doc! { "_id": car_id },
                doc! { "$set": {
                    "average_rating": average,
                    "total_reviews": total,
                    "rating_breakdown": {
                        "1": breakdown.one,
                        "2": breakdown.two,
                        "3": breakdown.three,
                        "4": breakdown.four,
                        "5": breakdown.five,
                    },
                    "updated_at": DateTime::now(),
                } },
            )
            .await?;

        Ok(())
    }
}
