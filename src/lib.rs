#![doc = "The `taskboard` library crate."]
#![doc = ""]
#![doc = "Domain models, storage, authentication, the task query engine, the daily"]
#![doc = "reminder job and the HTTP routing for the Taskboard service. The binary"]
#![doc = "(`main.rs`) wires these together from environment configuration."]

pub mod auth;
pub mod categories;
pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod reminder;
pub mod routes;
pub mod security;
pub mod state;
pub mod store;
pub mod tasks;
pub mod upload;

pub use error::AppError;
pub use state::{AppState, Dependencies};
