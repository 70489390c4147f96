// Library interface for testing

// Declare all modules
pub mod admin;
pub mod config;
pub mod constants;
pub mod credentials;
pub mod db;
pub mod error;
pub mod models;
pub mod prices;
pub mod schema;
pub mod serve;
pub mod submit;
pub mod uploads;

pub mod queries {
    pub mod ddl;
    pub mod prices;
    pub mod submissions;
}

pub use config::Config;
pub use db::{DynError, Store};
pub use serve::{app, AppState};
