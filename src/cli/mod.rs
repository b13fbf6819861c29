mod commands;
mod handlers;

pub use commands::{Cli, Commands};
pub use handlers::{handle_hash_password, handle_serve, init_tracing};
