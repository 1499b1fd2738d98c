use std::sync::Arc;

use actix_http::Payload;
use actix_web::{web, FromRequest, HttpMessage, HttpRequest};
use futures::future::LocalBoxFuture;
use log::info;
use mongodb::bson::{doc, oid::ObjectId, DateTime};
use mongodb::Client;

use crate::config::AppConfig;
use crate::db::collections;
use crate::errors::ApiError;
use crate::middleware::auth::Claims;
use crate::models::user::UserRole;

/// The authenticated caller, resolved against the users collection on
/// every request. Loading the live document means role changes and
/// deactivations take effect immediately instead of at next sign-in,
/// and it is where fixed admin accounts get their role healed.
pub struct Identity {
    pub user_id: ObjectId,
    pub email: String,
    pub role: UserRole,
}

/// Effective role for a signed-in user. Fixed admin emails are always
/// admins; the second value says whether the stored document is out of
/// date and needs a write.
pub fn resolve_role(stored: UserRole, email: &str, config: &AppConfig) -> (UserRole, bool) {
    if config.is_fixed_admin(email) && stored != UserRole::Admin {
        (UserRole::Admin, true)
    } else {
        (stored, false)
    }
}

impl FromRequest for Identity {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let claims = req.extensions().get::<Claims>().cloned();
        let client = req.app_data::<web::Data<Arc<Client>>>().cloned();
        let config = req.app_data::<web::Data<AppConfig>>().cloned();

        Box::pin(async move {
            let claims = claims
                .ok_or_else(|| ApiError::Unauthorized("User not authenticated".to_string()))?;
            let client = client
                .ok_or_else(|| ApiError::Internal("Database client not configured".to_string()))?;
            let config = config
                .ok_or_else(|| ApiError::Internal("App config not configured".to_string()))?;

            let user_id = ObjectId::parse_str(&claims.user_id)
                .map_err(|_| ApiError::Unauthorized("Invalid token".to_string()))?;

            let users = collections::users(&client);
            let user = users
                .find_one(doc! { "_id": user_id })
                .await?
                .ok_or_else(|| ApiError::Unauthorized("User not found".to_string()))?;

            if !user.is_active {
                return Err(ApiError::Forbidden("Account is deactivated".to_string()));
            }

            let (role, needs_update) = resolve_role(user.role, &user.email, &config);
            if needs_update {
                users
                    .update_one(
                        doc! { "_id": user_id },
                        doc! { "$set": {
                            "role": role.as_str(),
                            "updated_at": DateTime::now(),
                        } },
                    )
                    .await?;
                info!("Healed admin role for fixed admin account {}", user.email);
            }

            Ok(Identity {
                user_id,
                email: user.email,
                role,
            })
        })
    }
}

/// [`Identity`] plus the admin gate. Fixed admin emails pass because
/// their role was already healed to admin while resolving the identity.
pub struct AdminIdentity(pub Identity);

impl FromRequest for AdminIdentity {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let identity = Identity::from_request(req, payload);

        Box::pin(async move {
            let identity = identity.await?;
            if identity.role != UserRole::Admin {
                return Err(ApiError::Forbidden("Insufficient permissions".to_string()));
            }
            Ok(AdminIdentity(identity))
        })
    }
}
