use actix_web::{web, HttpResponse};
use futures::TryStreamExt;
use log::info;
use mongodb::bson::{doc, DateTime};
use mongodb::Client;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::db::collections;
use crate::errors::ApiError;
use crate::middleware::identity::AdminIdentity;
use crate::models::booking::BookingStatus;
use crate::models::user::{User, UserPublic};
use crate::routes::parse_object_id;

const DEFAULT_LIMIT: i64 = 100;
const MAX_LIMIT: i64 = 500;

/// Identifying fields written over a soft-deleted account.
const TOMBSTONE_NAME: &str = "Deleted User";
const TOMBSTONE_PHONE: &str = "";

#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    pub limit: Option<i64>,
}

/// GET /api/admin/users?limit=. Sanitized listing, newest first; the
/// password hash and the OTP state never leave the server.
pub async fn list_users(
    data: web::Data<Arc<Client>>,
    _admin: AdminIdentity,
    query: web::Query<UserListQuery>,
) -> Result<HttpResponse, ApiError> {
    let client = data.into_inner();
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    let users = collections::users(&client)
        .find(doc! {})
        .sort(doc! { "created_at": -1 })
        .limit(limit)
        .await?
        .try_collect::<Vec<User>>()
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "count": users.len(),
        "users": users.iter().map(UserPublic::from).collect::<Vec<_>>(),
    })))
}

/// DELETE /api/admin/users/{id}. Soft delete: the document is kept
/// (its bookings still reference it) but the identifying fields become
/// tombstone values and the account is deactivated. Refused while the
/// user holds a confirmed or active booking.
pub async fn delete_user(
    data: web::Data<Arc<Client>>,
    _admin: AdminIdentity,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let client = data.into_inner();
    let user_id = parse_object_id(&path.into_inner(), "user")?;

    let users = collections::users(&client);
    let user = users
        .find_one(doc! { "_id": user_id })
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    if !user.is_active {
        return Err(ApiError::Conflict("User is already deleted".to_string()));
    }

    let held = collections::bookings(&client)
        .count_documents(doc! {
            "user_id": user_id,
            "status": { "$in": [
                BookingStatus::Confirmed.as_str(),
                BookingStatus::Active.as_str(),
            ] },
        })
        .await?;
    if held > 0 {
        return Err(ApiError::Conflict(
            "User has confirmed or active bookings and cannot be deleted".to_string(),
        ));
    }

    users
        .update_one(
            doc! { "_id": user_id },
            doc! {
                "$set": {
                    "name": TOMBSTONE_NAME,
                    "email": User::tombstone_email(&user_id),
                    "phone": TOMBSTONE_PHONE,
                    "is_active": false,
                    "updated_at": DateTime::now(),
                },
                "$unset": { "reset_otp": "", "reset_otp_expires": "" },
            },
        )
        .await?;

    info!("User {} soft-deleted ({})", user_id.to_hex(), user.email);

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "User deleted",
    })))
}
