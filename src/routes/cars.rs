use actix_web::{web, HttpResponse};
use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::Client;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

use crate::db::collections;
use crate::errors::ApiError;
use crate::models::car::{Car, CarResponse, CarType};
use crate::models::review::{Review, ReviewResponse};
use crate::models::user::User;
use crate::routes::parse_object_id;

#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    #[serde(rename = "type")]
    pub car_type: Option<String>,
    pub available: Option<bool>,
    pub search: Option<String>,
}

/// GET /api/cars?type=&available=&search=. Public catalog; `search`
/// matches make or model, case-insensitive.
pub async fn list_cars(
    data: web::Data<Arc<Client>>,
    query: web::Query<CatalogQuery>,
) -> Result<HttpResponse, ApiError> {
    let client = data.into_inner();

    let mut filter = doc! {};
    if let Some(raw) = &query.car_type {
        let car_type = CarType::from_str(raw)
            .ok_or_else(|| ApiError::Validation(format!("Invalid car type: {}", raw)))?;
        filter.insert("car_type", car_type.as_str());
    }
    if let Some(available) = query.available {
        filter.insert("available", available);
    }
    if let Some(search) = &query.search {
        let pattern = regex::escape(search.trim());
        if !pattern.is_empty() {
            filter.insert(
                "$or",
                vec![
                    doc! { "make": { "$regex": &pattern, "$options": "i" } },
                    doc! { "model": { "$regex": &pattern, "$options": "i" } },
                ],
            );
        }
    }

    let cars = collections::cars(&client)
        .find(filter)
        .sort(doc! { "created_at": -1 })
        .await?
        .try_collect::<Vec<Car>>()
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "cars": cars.iter().map(CarResponse::from).collect::<Vec<_>>(),
    })))
}

/// GET /api/cars/{id}
pub async fn get_car(
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let client = data.into_inner();
    let car_id = parse_object_id(&path.into_inner(), "car")?;

    let car = collections::cars(&client)
        .find_one(doc! { "_id": car_id })
        .await?
        .ok_or_else(|| ApiError::NotFound("Car not found".to_string()))?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "car": CarResponse::from(&car),
    })))
}

/// GET /api/cars/{id}/reviews. Active car reviews with the reviewer's
/// name attached; hidden reviews stay out of this listing.
pub async fn car_reviews(
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let client = data.into_inner();
    let car_id = parse_object_id(&path.into_inner(), "car")?;

    if collections::cars(&client)
        .find_one(doc! { "_id": car_id })
        .await?
        .is_none()
    {
        return Err(ApiError::NotFound("Car not found".to_string()));
    }

    let reviews = collections::reviews(&client)
        .find(doc! { "car_id": car_id, "kind": "car", "is_active": true })
        .sort(doc! { "created_at": -1 })
        .await?
        .try_collect::<Vec<Review>>()
        .await?;

    let user_ids: Vec<_> = reviews.iter().map(|review| review.user_id).collect();
    let users = collections::users(&client)
        .find(doc! { "_id": { "$in": user_ids } })
        .await?
        .try_collect::<Vec<User>>()
        .await?;
    let names: HashMap<_, _> = users
        .iter()
        .filter_map(|user| user.id.map(|id| (id, user.name.as_str())))
        .collect();

    let reviews: Vec<ReviewResponse> = reviews
        .iter()
        .map(|review| {
            let response = ReviewResponse::from(review);
            match names.get(&review.user_id) {
                Some(name) => response.with_user_name((*name).to_string()),
                None => response,
            }
        })
        .collect();

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "reviews": reviews,
    })))
}
