use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpooldexError {
    #[error("{field} is required")]
    Validation { field: &'static str },

    #[error("Invalid color code '{0}'. Expected #RRGGBB")]
    InvalidColorHex(String),

    #[error("Filament {index} no longer exists ({len} in inventory). Reload and try again.")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Filament {index} changed since it was selected. Reload and try again.")]
    StaleRecord { index: usize },

    #[error("Invalid form input: {0}")]
    InvalidInput(String),

    #[error("Incorrect password")]
    Authentication,

    #[error("Login required")]
    NotAuthenticated,

    #[error("Inventory data is corrupted: {0}")]
    DataCorruption(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl SpooldexError {
    /// Errors the operator can fix by correcting the form or reloading.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            SpooldexError::Validation { .. }
                | SpooldexError::InvalidColorHex(_)
                | SpooldexError::IndexOutOfRange { .. }
                | SpooldexError::StaleRecord { .. }
                | SpooldexError::InvalidInput(_)
                | SpooldexError::Authentication
                | SpooldexError::NotAuthenticated
        )
    }
}

pub type Result<T> = std::result::Result<T, SpooldexError>;
