use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub project_name: String,
    pub api_v1_str: String,
    pub secret_key: String,
    pub access_token_expire_minutes: i64,
    pub mongo_uri: String,
    pub mongo_database: String,
    pub google_api_key: Option<String>,
    pub backend_cors_origins: Vec<String>,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        // Determine environment (defaults to dev)
        let env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // Build configuration from config/*.toml + ENV overrides
        let config_builder = config::Config::builder()
            // Load base config from TOML file
            .add_source(
                config::File::with_name(&format!("config/{}", env)).required(false), // Allow missing config file, fallback to ENV
            )
            // Override with environment variables (prefix: APP_)
            .add_source(config::Environment::with_prefix("APP").separator("__"));

        let settings = config_builder.build()?;

        // Extract values with fallbacks to ENV or defaults
        let project_name = settings
            .get_string("project.name")
            .or_else(|_| env::var("PROJECT_NAME"))
            .unwrap_or_else(|_| "FractionMania".to_string());

        let api_v1_str = settings
            .get_string("api.v1_prefix")
            .or_else(|_| env::var("API_V1_STR"))
            .unwrap_or_else(|_| "/api/v1".to_string());

        let secret_key = settings
            .get_string("auth.secret_key")
            .or_else(|_| env::var("SECRET_KEY"))
            .unwrap_or_else(|_| {
                if env == "prod" {
                    panic!("FATAL: SECRET_KEY must be set in production!");
                }
                eprintln!("WARNING: Using default SECRET_KEY (dev mode only!)");
                "dev-secret-only-for-local-testing".to_string()
            });

        let access_token_expire_minutes = settings
            .get_int("auth.access_token_expire_minutes")
            .ok()
            .or_else(|| {
                env::var("ACCESS_TOKEN_EXPIRE_MINUTES")
                    .ok()
                    .and_then(|v| v.parse().ok())
            })
            .unwrap_or(60 * 24 * 8); // 8 days

        let mongo_uri = settings
            .get_string("database.mongo_uri")
            .or_else(|_| env::var("MONGO_URI"))
            .unwrap_or_else(|_| {
                eprintln!("WARNING: MONGO_URI not set, using local MongoDB");
                "mongodb://localhost:27017".to_string()
            });

        let mongo_database = settings
            .get_string("database.mongo_database")
            .or_else(|_| env::var("MONGO_DATABASE"))
            .unwrap_or_else(|_| "fractionmania".to_string());

        let google_api_key = settings
            .get_string("google.api_key")
            .ok()
            .or_else(|| env::var("GOOGLE_API_KEY").ok());

        let backend_cors_origins = settings
            .get_array("cors.origins")
            .ok()
            .map(|values| {
                values
                    .into_iter()
                    .filter_map(|v| v.into_string().ok())
                    .collect::<Vec<_>>()
            })
            .or_else(|| {
                env::var("BACKEND_CORS_ORIGINS").ok().map(|raw| {
                    raw.split(',')
                        .map(|origin| origin.trim().to_string())
                        .filter(|origin| !origin.is_empty())
                        .collect()
                })
            })
            .unwrap_or_else(|| vec!["http://localhost:3000".to_string()]);

        Ok(Config {
            project_name,
            api_v1_str,
            secret_key,
            access_token_expire_minutes,
            mongo_uri,
            mongo_database,
            google_api_key,
            backend_cors_origins,
        })
    }
}
