use rocket::http::Method;
use rocket_cors::{AllowedOrigins, CorsOptions};
use std::env;

/// Splits a comma separated origin list, dropping blanks.
pub fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// The front end is usually served by a local dev server on another port.
pub fn create_cors() -> rocket_cors::Cors {
    let allowed_origins_env =
        env::var("CORS_ALLOWED_ORIGINS").unwrap_or_else(|_| "http://localhost:5173".to_string());
    let allowed_origins = AllowedOrigins::some_exact(&parse_origins(&allowed_origins_env));

    CorsOptions {
        allowed_origins,
        allowed_methods: vec![Method::Get, Method::Post, Method::Options]
            .into_iter()
            .map(|m| m.into())
            .collect(),
        allowed_headers: rocket_cors::AllowedHeaders::some(&["Accept", "Content-Type"]),
        ..Default::default()
    }
    .to_cors()
    .expect("Failed to create CORS configuration")
}
