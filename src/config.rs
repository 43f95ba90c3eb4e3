/// Application configuration, parsed from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    /// HS256 key used to verify session bearer tokens.
    pub session_secret: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let session_secret =
            std::env::var("SESSION_SECRET").expect("SESSION_SECRET must be set");
        assert!(!session_secret.is_empty(), "SESSION_SECRET must not be empty");

        Self {
            database_url: std::env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            session_secret,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .expect("PORT must be a valid u16"),
        }
    }
}
