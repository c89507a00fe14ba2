use crate::error::ConfigError;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub jwt: JwtSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
    /// Deployment platform. Destructive admin endpoints only run on `dev`.
    pub platform: String,
}

impl ApplicationSettings {
    pub fn is_dev(&self) -> bool {
        self.platform == "dev"
    }
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }
}

/// Longest token lifetime accepted from configuration (10 years, in seconds)
pub const MAX_TOKEN_EXPIRY: i64 = 10 * 365 * 24 * 60 * 60;

/// Access and refresh token settings
#[derive(serde::Deserialize, Clone)]
pub struct JwtSettings {
    /// HMAC signing secret. Rotating it invalidates every outstanding access token.
    pub secret: String,
    pub access_token_expiry: i64,   // seconds (3600 = 1 hour)
    pub refresh_token_expiry: i64,  // seconds (5184000 = 60 days)
}

impl JwtSettings {
    pub fn access_token_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.access_token_expiry)
    }

    pub fn refresh_token_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.refresh_token_expiry)
    }
}

impl Settings {
    /// Reject settings the service cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("jwt.secret".to_string()));
        }
        for (name, expiry) in [
            ("jwt.access_token_expiry", self.jwt.access_token_expiry),
            ("jwt.refresh_token_expiry", self.jwt.refresh_token_expiry),
        ] {
            if expiry <= 0 || expiry > MAX_TOKEN_EXPIRY {
                return Err(ConfigError::InvalidValue(format!(
                    "{} must be between 1 and {} seconds",
                    name, MAX_TOKEN_EXPIRY
                )));
            }
        }
        Ok(())
    }
}

/// Load settings from `configuration.yaml` (optional) and `APP_*` environment
/// variables, e.g. `APP_JWT__SECRET` or `APP_APPLICATION__PLATFORM=dev`.
pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let settings = config::Config::builder()
        .set_default("application.host", "127.0.0.1")?
        .set_default("application.port", 8080)?
        .set_default("application.platform", "")?
        .set_default("jwt.access_token_expiry", 3600)?
        .set_default("jwt.refresh_token_expiry", 60 * 24 * 60 * 60)?
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;
    settings.try_deserialize::<Settings>()
}
