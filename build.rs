use std::env;
use std::fs;
use std::path::Path;

/// Variables leídas con option_env!() en src/config.rs
const CONFIG_VARS: &[&str] = &[
    "API_BASE_URL",
    "LIST_ROUTES_URL",
    "CREATE_ROUTE_URL",
    "LIST_FLIGHTS_URL",
    "LIST_IMAGES_URL",
    "UPLOAD_IMAGE_URL",
    "NOTIFICATIONS_URL",
    "ENVIRONMENT",
    "ENABLE_LOGGING",
    "NETWORK_TIMEOUT_SECONDS",
    "RETRY_ATTEMPTS",
    "SESSION_DURATION_MINUTES",
    "SESSION_WARNING_MINUTES",
    "SESSION_CHECK_INTERVAL_SECONDS",
    "IMAGES_PAGE_SIZE",
    "FLIGHTS_PAGE_SIZE",
    "NOTIFICATIONS_PAGE_SIZE",
    "NOTIFICATIONS_POLL_SECONDS",
    "FEEDBACK_POLICY",
];

/// KEY=VALUE por línea; comentarios (#) y comillas se ignoran
fn parse_env_file(contents: &str) -> Vec<(String, String)> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim().to_string(), value.trim().trim_matches('"').to_string()))
        .collect()
}

fn main() {
    let env_file = Path::new(".env");
    if let Ok(contents) = fs::read_to_string(env_file) {
        println!("cargo:rerun-if-changed=.env");
        for (key, value) in parse_env_file(&contents) {
            // El entorno real tiene prioridad sobre .env
            if env::var(&key).is_err() {
                println!("cargo:rustc-env={}={}", key, value);
            }
        }
    }

    println!("cargo:rerun-if-changed=build.rs");
    for var in CONFIG_VARS {
        println!("cargo:rerun-if-env-changed={}", var);
    }
}
