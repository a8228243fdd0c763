//! Catalog Server - product catalog HTTP service
//!
//! # Modules
//!
//! ```text
//! catalog-server/src/
//! ├── core/        # config, shared state, server, startup errors
//! ├── catalog/     # query criteria, uniqueness guard, slugs, store traits
//! ├── services/    # product orchestration
//! ├── db/          # SQLite pool, repositories, WHERE-clause builder
//! ├── auth/        # JWT, argon2, auth middleware and extractor
//! ├── api/         # HTTP handlers, one module per resource
//! ├── routes/      # router assembly and middleware stack
//! ├── middleware/  # request logging
//! └── utils/       # logger, input validation
//! ```

pub mod api;
pub mod auth;
pub mod catalog;
pub mod core;
pub mod db;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod utils;

pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use services::ProductService;
pub use utils::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

pub use utils::logger::{init_logger, init_logger_with_file};

/// Security event log (target `security`)
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

/// Load `.env`, read the configuration and start logging
pub fn setup_environment() -> anyhow::Result<Config> {
    if let Err(e) = dotenv::dotenv()
        && !e.not_found()
    {
        eprintln!("Failed to load .env: {e}");
    }

    let config = Config::from_env()?;
    init_logger_with_file(
        Some(&config.log_level),
        config.log_json,
        config.log_dir.as_deref(),
    );
    Ok(config)
}

pub fn print_banner() {
    println!(
        r#"
   ______      __        __
  / ____/___ _/ /_____ _/ /___  ____ _
 / /   / __ `/ __/ __ `/ / __ \/ __ `/
/ /___/ /_/ / /_/ /_/ / / /_/ / /_/ /
\____/\__,_/\__/\__,_/_/\____/\__, /
                             /____/
    "#
    );
}
