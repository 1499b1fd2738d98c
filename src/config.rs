use std::env;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DB_NAME: &str = "rentora";
const DEFAULT_OTP_TTL_MINUTES: i64 = 10;

/// Bootstrap admin accounts. Overridable through `ADMIN_EMAILS` so the
/// allow-list is configuration, not business logic baked into the code.
const DEFAULT_ADMIN_EMAILS: &str = "admin@rentora.com,owner@rentora.com";

const DEFAULT_BRANCH_ADDRESS: &str = "Rentora Head Office, 128 Lakeview Drive";
const DEFAULT_BRANCH_CITY: &str = "Austin";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub mongodb_uri: String,
    pub db_name: String,
    /// Emails that always resolve to the admin role, lowercase.
    pub admin_emails: Vec<String>,
    pub branch_address: String,
    pub branch_city: String,
    pub otp_ttl_minutes: i64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let host = env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
        let port: u16 = env::var("PORT")
            .unwrap_or_else(|_| DEFAULT_PORT.to_string())
            .parse()
            .unwrap_or(DEFAULT_PORT);

        let mongodb_uri = env::var("MONGODB_URI").expect("MONGODB_URI must be set");
        let db_name = env::var("MONGODB_DB").unwrap_or_else(|_| DEFAULT_DB_NAME.to_string());

        let admin_emails = parse_admin_emails(
            &env::var("ADMIN_EMAILS").unwrap_or_else(|_| DEFAULT_ADMIN_EMAILS.to_string()),
        );

        let branch_address =
            env::var("BRANCH_ADDRESS").unwrap_or_else(|_| DEFAULT_BRANCH_ADDRESS.to_string());
        let branch_city =
            env::var("BRANCH_CITY").unwrap_or_else(|_| DEFAULT_BRANCH_CITY.to_string());

        let otp_ttl_minutes = env::var("OTP_TTL_MINUTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_OTP_TTL_MINUTES);

        AppConfig {
            host,
            port,
            mongodb_uri,
            db_name,
            admin_emails,
            branch_address,
            branch_city,
            otp_ttl_minutes,
        }
    }

    /// Email comparison is case-insensitive everywhere the fixed list is
    /// consulted: registration, the per-request role heal, and the admin
    /// gate.
    pub fn is_fixed_admin(&self, email: &str) -> bool {
        let email = email.trim().to_lowercase();
        self.admin_emails.iter().any(|admin| *admin == email)
    }
}

fn parse_admin_emails(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}
