use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// Public base URL used when deriving image URLs, e.g. `http://localhost:3000`.
    pub app_url: String,
    /// Directory the `/storage` route serves and uploaded files live under.
    pub storage_dir: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let app_url = env::var("APP_URL").unwrap_or_else(|_| format!("http://{host}:{port}"));
        let storage_dir = env::var("STORAGE_DIR").unwrap_or_else(|_| "storage".to_string());
        Ok(Self {
            port,
            database_url,
            host,
            app_url,
            storage_dir,
        })
    }
}
