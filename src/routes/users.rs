use actix_web::{web, HttpResponse};
use bson::{doc, DateTime};
use mongodb::Client;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::db::collections;
use crate::errors::ApiError;
use crate::middleware::identity::Identity;
use crate::models::user::UserPublic;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub license_number: Option<String>,
    pub address: Option<String>,
}

/// PUT /api/users/me. Partial update of the caller's own profile;
/// email and role are not editable here.
pub async fn update_profile(
    data: web::Data<Arc<Client>>,
    identity: Identity,
    input: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse, ApiError> {
    let client = data.into_inner();
    let input = input.into_inner();

    let mut update = doc! {};
    if let Some(name) = &input.name {
        let name = name.trim();
        if name.is_empty() {
            return Err(ApiError::Validation("Name cannot be empty".to_string()));
        }
        update.insert("name", name);
    }
    if let Some(phone) = &input.phone {
        update.insert("phone", phone.trim());
    }
    if let Some(license_number) = &input.license_number {
        update.insert("license_number", license_number.trim());
    }
    if let Some(address) = &input.address {
        update.insert("address", address.trim());
    }
    if update.is_empty() {
        return Err(ApiError::Validation("No fields to update".to_string()));
    }
    update.insert("updated_at", DateTime::now());

    let users = collections::users(&client);
    users
        .update_one(doc! { "_id": identity.user_id }, doc! { "$set": update })
        .await?;

    let user = users
        .find_one(doc! { "_id": identity.user_id })
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Profile updated",
        "user": UserPublic::from(&user),
    })))
}
