use actix_web::{web, HttpResponse};
use chrono::{Datelike, Utc};
use log::info;
use mongodb::bson::{doc, oid::ObjectId, DateTime};
use mongodb::Client;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::db::collections;
use crate::errors::ApiError;
use crate::middleware::identity::AdminIdentity;
use crate::models::booking::BookingStatus;
use crate::models::car::{Car, CarResponse, CarType, RatingBreakdown};
use crate::routes::parse_object_id;

const MIN_YEAR: i32 = 1950;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCarRequest {
    pub make: String,
    pub model: String,
    pub year: i32,
    #[serde(rename = "type")]
    pub car_type: String,
    pub registration_number: Option<String>,
    pub price_per_day: f64,
    pub price_per_hour: f64,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

/// POST /api/admin/cars. New cars enter the fleet available.
pub async fn create_car(
    data: web::Data<Arc<Client>>,
    _admin: AdminIdentity,
    input: web::Json<CreateCarRequest>,
) -> Result<HttpResponse, ApiError> {
    let client = data.into_inner();
    let input = input.into_inner();

    let make = input.make.trim();
    let model = input.model.trim();
    if make.is_empty() || model.is_empty() {
        return Err(ApiError::Validation(
            "Make and model are required".to_string(),
        ));
    }
    let car_type = parse_car_type(&input.car_type)?;
    validate_year(input.year)?;
    validate_prices(input.price_per_day, input.price_per_hour)?;

    let cars = collections::cars(&client);
    let registration_number = normalize_registration(input.registration_number);
    if let Some(registration) = &registration_number {
        if cars
            .find_one(doc! { "registration_number": registration })
            .await?
            .is_some()
        {
            return Err(ApiError::Conflict(
                "A car with this registration number already exists".to_string(),
            ));
        }
    }

    let now = DateTime::now();
    let mut car = Car {
        id: None,
        make: make.to_string(),
        model: model.to_string(),
        year: input.year,
        car_type,
        registration_number,
        price_per_day: input.price_per_day,
        price_per_hour: input.price_per_hour,
        available: true,
        description: input.description,
        image_url: input.image_url,
        average_rating: 0.0,
        total_reviews: 0,
        rating_breakdown: RatingBreakdown::default(),
        created_at: Some(now),
        updated_at: Some(now),
    };

    let result = cars.insert_one(&car).await?;
    car.id = result.inserted_id.as_object_id();

    info!("Car added to fleet: {} {} ({})", car.make, car.model, car.year);

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Car created",
        "car": CarResponse::from(&car),
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCarRequest {
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    #[serde(rename = "type")]
    pub car_type: Option<String>,
    pub registration_number: Option<String>,
    pub price_per_day: Option<f64>,
    pub price_per_hour: Option<f64>,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

/// PUT /api/admin/cars/{id}. Partial update; the availability flag is
/// not editable here, it has its own endpoint.
pub async fn update_car(
    data: web::Data<Arc<Client>>,
    _admin: AdminIdentity,
    path: web::Path<String>,
    input: web::Json<UpdateCarRequest>,
) -> Result<HttpResponse, ApiError> {
    let client = data.into_inner();
    let input = input.into_inner();
    let car_id = parse_object_id(&path.into_inner(), "car")?;
    let cars = collections::cars(&client);

    let mut update = doc! {};
    if let Some(make) = &input.make {
        let make = make.trim();
        if make.is_empty() {
            return Err(ApiError::Validation("Make cannot be empty".to_string()));
        }
        update.insert("make", make);
    }
    if let Some(model) = &input.model {
        let model = model.trim();
        if model.is_empty() {
            return Err(ApiError::Validation("Model cannot be empty".to_string()));
        }
        update.insert("model", model);
    }
    if let Some(year) = input.year {
        validate_year(year)?;
        update.insert("year", year);
    }
    if let Some(raw) = &input.car_type {
        update.insert("car_type", parse_car_type(raw)?.as_str());
    }
    if let Some(price) = input.price_per_day {
        if price < 0.0 {
            return Err(ApiError::Validation(
                "Price per day cannot be negative".to_string(),
            ));
        }
        update.insert("price_per_day", price);
    }
    if let Some(price) = input.price_per_hour {
        if price < 0.0 {
            return Err(ApiError::Validation(
                "Price per hour cannot be negative".to_string(),
            ));
        }
        update.insert("price_per_hour", price);
    }
    if let Some(registration) = normalize_registration(input.registration_number) {
        if cars
            .find_one(doc! {
                "registration_number": &registration,
                "_id": { "$ne": car_id },
            })
            .await?
            .is_some()
        {
            return Err(ApiError::Conflict(
                "A car with this registration number already exists".to_string(),
            ));
        }
        update.insert("registration_number", registration);
    }
    if let Some(description) = input.description {
        update.insert("description", description);
    }
    if let Some(image_url) = input.image_url {
        update.insert("image_url", image_url);
    }
    if update.is_empty() {
        return Err(ApiError::Validation("No fields to update".to_string()));
    }
    update.insert("updated_at", DateTime::now());

    let result = cars
        .update_one(doc! { "_id": car_id }, doc! { "$set": update })
        .await?;
    if result.matched_count == 0 {
        return Err(ApiError::NotFound("Car not found".to_string()));
    }

    let car = fetch_car(&client, car_id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Car updated",
        "car": CarResponse::from(&car),
    })))
}

/// DELETE /api/admin/cars/{id}. Refused while a confirmed or active
/// booking still references the car.
pub async fn delete_car(
    data: web::Data<Arc<Client>>,
    _admin: AdminIdentity,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let client = data.into_inner();
    let car_id = parse_object_id(&path.into_inner(), "car")?;

    let held = collections::bookings(&client)
        .count_documents(doc! {
            "car_id": car_id,
            "status": { "$in": [
                BookingStatus::Confirmed.as_str(),
                BookingStatus::Active.as_str(),
            ] },
        })
        .await?;
    if held > 0 {
        return Err(ApiError::Conflict(
            "Car has confirmed or active bookings and cannot be deleted".to_string(),
        ));
    }

    let result = collections::cars(&client)
        .delete_one(doc! { "_id": car_id })
        .await?;
    if result.deleted_count == 0 {
        return Err(ApiError::NotFound("Car not found".to_string()));
    }

    info!("Car {} removed from fleet", car_id.to_hex());

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Car deleted",
    })))
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityRequest {
    pub available: bool,
}

/// PUT /api/admin/cars/{id}/availability. Direct override of the
/// cached flag, outside the transition table.
pub async fn set_availability(
    data: web::Data<Arc<Client>>,
    _admin: AdminIdentity,
    path: web::Path<String>,
    input: web::Json<AvailabilityRequest>,
) -> Result<HttpResponse, ApiError> {
    let client = data.into_inner();
    let car_id = parse_object_id(&path.into_inner(), "car")?;

    let result = collections::cars(&client)
        .update_one(
            doc! { "_id": car_id },
            doc! { "$set": {
                "available": input.available,
                "updated_at": DateTime::now(),
            } },
        )
        .await?;
    if result.matched_count == 0 {
        return Err(ApiError::NotFound("Car not found".to_string()));
    }

    info!(
        "Car {} availability overridden to {}",
        car_id.to_hex(),
        input.available
    );

    let car = fetch_car(&client, car_id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Car availability updated",
        "car": CarResponse::from(&car),
    })))
}

async fn fetch_car(client: &Client, car_id: ObjectId) -> Result<Car, ApiError> {
    collections::cars(client)
        .find_one(doc! { "_id": car_id })
        .await?
        .ok_or_else(|| ApiError::NotFound("Car not found".to_string()))
}

fn parse_car_type(raw: &str) -> Result<CarType, ApiError> {
    CarType::from_str(raw).ok_or_else(|| {
        ApiError::Validation(format!(
            "Car type must be one of SUV, Sedan, Hatchback, MPV, Luxury, Sports (got '{}')",
            raw
        ))
    })
}

fn validate_year(year: i32) -> Result<(), ApiError> {
    // Next-year models show up in fleets ahead of the calendar.
    let max_year = Utc::now().year() + 1;
    if year < MIN_YEAR || year > max_year {
        return Err(ApiError::Validation(format!(
            "Year must be between {} and {}",
            MIN_YEAR, max_year
        )));
    }
    Ok(())
}

fn validate_prices(price_per_day: f64, price_per_hour: f64) -> Result<(), ApiError> {
    if price_per_day < 0.0 || price_per_hour < 0.0 {
        return Err(ApiError::Validation(
            "Prices cannot be negative".to_string(),
        ));
    }
    Ok(())
}

fn normalize_registration(raw: Option<String>) -> Option<String> {
    raw.map(|registration| registration.trim().to_uppercase())
        .filter(|registration| !registration.is_empty())
}
