use std::sync::Arc;
use std::time::Duration;

use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{web, App, Error};
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use mongodb::bson::oid::ObjectId;
use mongodb::options::ClientOptions;

use rentora_api::config::AppConfig;
use rentora_api::middleware::auth::{jwt_secret, Claims};
use rentora_api::routes;

pub struct TestApp {
    pub client: Arc<mongodb::Client>,
    pub config: AppConfig,
}

impl TestApp {
    /// The MongoDB client here is lazy: none of the integration tests
    /// send a request that reaches the database, so the suite runs
    /// without a live server. Timeouts are short so a request that does
    /// slip through to the database fails fast instead of hanging.
    pub async fn new() -> Self {
        let mongo_uri = std::env::var("MONGODB_URI")
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());

        let mut options = ClientOptions::parse(&mongo_uri)
            .await
            .expect("invalid MongoDB URI");
        options.connect_timeout = Some(Duration::from_millis(500));
        options.server_selection_timeout = Some(Duration::from_millis(500));
        let client =
            Arc::new(mongodb::Client::with_options(options).expect("failed to build client"));

        let config = AppConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            mongodb_uri: mongo_uri,
            db_name: "rentora_test".to_string(),
            admin_emails: vec!["admin@rentora.com".to_string()],
            branch_address: "128 Lakeview Drive".to_string(),
            branch_city: "Austin".to_string(),
            otp_ttl_minutes: 10,
        };

        Self { client, config }
    }

    /// The real application: the same route tree and middleware stack
    /// `main` builds, minus the outer CORS/Logger wrapping.
    pub fn create_app(
        &self,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse,
            Error = Error,
            InitError = (),
        >,
    > {
        App::new()
            .app_data(web::Data::new(self.client.clone()))
            .app_data(web::Data::new(self.config.clone()))
            .configure(routes::configure)
    }
}

/// A structurally valid token signed with the wrong key. The middleware
/// must reject it before any handler or database access.
pub fn forged_token() -> String {
    bearer(&token_with(
        &ObjectId::new(),
        "intruder@example.com",
        3600,
        "not-the-server-secret",
    ))
}

/// Signed with the server secret but expired well past the validation
/// leeway.
pub fn expired_token() -> String {
    bearer(&token_with(
        &ObjectId::new(),
        "late@example.com",
        -7200,
        &jwt_secret(),
    ))
}

fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

fn token_with(user_id: &ObjectId, email: &str, ttl_secs: i64, secret: &str) -> String {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: email.to_string(),
        iat: now as usize,
        exp: (now + ttl_secs) as usize,
        user_id: user_id.to_hex(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("failed to encode test token")
}
