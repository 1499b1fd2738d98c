use actix_web::web;
use mongodb::bson::oid::ObjectId;

use crate::errors::ApiError;
use crate::middleware::auth::AuthMiddleware;

pub mod admin;
pub mod auth;
pub mod bookings;
pub mod cars;
pub mod health;
pub mod reviews;
pub mod users;

/// The whole route tree. `main` and the integration tests both build the
/// app through this, so the tests exercise the real routing and
/// middleware stack.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        ApiError::Validation(format!("Invalid request body: {}", err)).into()
    }))
    .route("/health", web::get().to(health::health_check))
    .service(
        web::scope("/api")
            .service(
                web::scope("/auth")
                    .route("/signup", web::post().to(auth::signup))
                    .route("/signin", web::post().to(auth::signin))
                    .route("/forgot-password", web::post().to(auth::forgot_password))
                    .route("/reset-password", web::post().to(auth::reset_password))
                    .service(
                        web::scope("")
                            .wrap(AuthMiddleware)
                            .route("/session", web::get().to(auth::session)),
                    ),
            )
            .service(
                web::scope("/cars")
                    .route("", web::get().to(cars::list_cars))
                    .route("/{id}", web::get().to(cars::get_car))
                    .route("/{id}/reviews", web::get().to(cars::car_reviews)),
            )
            // Everything below requires a bearer token; admin handlers
            // additionally resolve AdminIdentity.
            .service(
                web::scope("")
                    .wrap(AuthMiddleware)
                    .service(
                        web::scope("/bookings")
                            .route("", web::post().to(bookings::create_booking))
                            .route("/my-bookings", web::get().to(bookings::my_bookings))
                            .route("/{id}/cancel", web::put().to(bookings::cancel_booking))
                            .route("/{id}/complete", web::put().to(bookings::complete_booking)),
                    )
                    .route("/reviews", web::post().to(reviews::create_review))
                    .route("/users/me", web::put().to(users::update_profile))
                    .configure(admin::config),
            ),
    );
}

/// Path and body ids arrive as hex strings; anything that does not parse
/// is a validation error naming the offending reference.
pub(crate) fn parse_object_id(raw: &str, what: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(raw).map_err(|_| ApiError::Validation(format!("Invalid {} id", what)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_object_id_accepts_hex() {
        let id = ObjectId::new();
        assert_eq!(parse_object_id(&id.to_hex(), "car").unwrap(), id);
    }

    #[test]
    fn test_parse_object_id_rejects_garbage() {
        let err = parse_object_id("not-an-id", "booking").unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert!(err.to_string().contains("booking"));
    }
}
