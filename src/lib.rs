pub mod auth;
pub mod cli;
pub mod config;
pub mod entity;
pub mod error;
pub mod filter;
pub mod inventory;
pub mod storage;
pub mod web;

pub use auth::AuthGate;
pub use config::AppConfig;
pub use entity::{ColorHex, FilamentDraft, FilamentRecord};
pub use error::{Result, SpooldexError};
pub use inventory::InventoryService;
pub use web::{build_router, AppState};
