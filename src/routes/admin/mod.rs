use actix_web::web;

pub mod bookings;
pub mod cars;
pub mod reviews;
pub mod stats;
pub mod users;

/// Back-office surface. Mounted inside the authenticated scope; every
/// handler here resolves `AdminIdentity`, so a valid token with a
/// non-admin role gets a 403 from the extractor.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .service(
                web::scope("/bookings")
                    .route("", web::get().to(bookings::list_bookings))
                    .route("/{id}/status", web::put().to(bookings::set_status)),
            )
            .service(
                web::scope("/cars")
                    .route("", web::post().to(cars::create_car))
                    .route("/{id}", web::put().to(cars::update_car))
                    .route("/{id}", web::delete().to(cars::delete_car))
                    .route("/{id}/availability", web::put().to(cars::set_availability)),
            )
            .service(
                web::scope("/users")
                    .route("", web::get().to(users::list_users))
                    .route("/{id}", web::delete().to(users::delete_user)),
            )
            .service(
                web::scope("/reviews")
                    .route("/{id}", web::put().to(reviews::moderate_review))
                    .route("/{id}", web::delete().to(reviews::delete_review)),
            )
            .route("/stats", web::get().to(stats::dashboard)),
    );
}
