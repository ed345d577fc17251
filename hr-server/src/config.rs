//! Server configuration

use chrono_tz::Tz;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Minimum signing secret length outside development
const MIN_SECRET_LEN: usize = 32;

/// HR server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL (None = in-memory store, development only)
    pub database_url: Option<String>,
    /// HTTP port
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    /// Access token signing secret
    pub jwt_secret: String,
    /// Refresh token signing secret (must differ from `jwt_secret`)
    pub jwt_refresh_secret: String,
    /// Access token lifetime (minutes)
    pub jwt_expiration_minutes: i64,
    /// Refresh token lifetime (days)
    pub jwt_refresh_expiration_days: i64,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    /// Timezone used to bucket attendance into calendar days
    pub business_timezone: Tz,
    /// Debit leave balances on approval
    pub leave_balance_enforcement: bool,
    /// Seed demo users and leave types at start-up
    pub seed_demo_data: bool,
    /// Allowed CORS origin (None = any)
    pub cors_allow_origin: Option<String>,
    /// Emit JSON logs
    pub log_json: bool,
}

impl Config {
    /// Require a secret env var: must be set, non-empty and long enough in
    /// non-development environments.
    fn require_secret(name: &str, environment: &str) -> Result<String, BoxError> {
        let val = match std::env::var(name) {
            Ok(v) => v,
            Err(_) => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                format!("dev-{name}-not-for-production-use-only")
            }
        };
        if environment != "development" && val.len() < MIN_SECRET_LEN {
            return Err(format!(
                "{name} must be at least {MIN_SECRET_LEN} characters in {environment} environment"
            )
            .into());
        }
        Ok(val)
    }

    fn env_flag(name: &str, default: bool) -> bool {
        std::env::var(name)
            .ok()
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(default)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());
        let is_dev = environment == "development";

        let database_url = std::env::var("DATABASE_URL").ok().filter(|s| !s.is_empty());
        if database_url.is_none() && !is_dev {
            return Err("DATABASE_URL must be set outside development".into());
        }

        let jwt_secret = Self::require_secret("JWT_SECRET", &environment)?;
        let jwt_refresh_secret = Self::require_secret("JWT_REFRESH_SECRET", &environment)?;
        if jwt_secret == jwt_refresh_secret {
            return Err("JWT_SECRET and JWT_REFRESH_SECRET must differ".into());
        }

        let tz_name = std::env::var("BUSINESS_TIMEZONE").unwrap_or_else(|_| "UTC".into());
        let business_timezone: Tz = tz_name
            .parse()
            .map_err(|e| format!("invalid BUSINESS_TIMEZONE {tz_name}: {e}"))?;

        Ok(Self {
            database_url,
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5000),
            environment,
            jwt_secret,
            jwt_refresh_secret,
            jwt_expiration_minutes: std::env::var("JWT_EXPIRATION_MINUTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(15),
            jwt_refresh_expiration_days: std::env::var("JWT_REFRESH_EXPIRATION_DAYS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(7),
            jwt_issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "hr-server".into()),
            jwt_audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "hr-clients".into()),
            business_timezone,
            leave_balance_enforcement: Self::env_flag("LEAVE_BALANCE_ENFORCEMENT", true),
            seed_demo_data: Self::env_flag("SEED_DEMO_DATA", is_dev),
            cors_allow_origin: std::env::var("CORS_ALLOW_ORIGIN")
                .ok()
                .filter(|s| !s.is_empty()),
            log_json: std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")),
        })
    }

    /// Development configuration with an in-memory store (used by tests)
    pub fn development() -> Self {
        Self {
            database_url: None,
            http_port: 5000,
            environment: "development".into(),
            jwt_secret: "dev-access-secret-0123456789abcdef".into(),
            jwt_refresh_secret: "dev-refresh-secret-0123456789abcdef".into(),
            jwt_expiration_minutes: 15,
            jwt_refresh_expiration_days: 7,
            jwt_issuer: "hr-server".into(),
            jwt_audience: "hr-clients".into(),
            business_timezone: chrono_tz::UTC,
            leave_balance_enforcement: true,
            seed_demo_data: false,
            cors_allow_origin: None,
            log_json: false,
        }
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}
