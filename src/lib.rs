pub mod api;
pub mod config;
pub mod db;
pub mod utils;

pub use db::DbPool;

use config::Config;

pub struct AppState {
    pub config: Config,
    /// Resolved HS256 signing secret (generated at startup when unconfigured).
    pub jwt_secret: String,
    pub db: DbPool,
}

impl AppState {
    pub fn new(config: Config, jwt_secret: String, db: DbPool) -> Self {
        Self {
            config,
            jwt_secret,
            db,
        }
    }
}
