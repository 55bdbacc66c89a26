use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// Fallback shown when the server gives no message of its own
pub const GENERIC_FAILURE: &str = "Request failed, please try again";

/// Advisory rejections raised by the composers.
///
/// None of these are fatal: the operation that produced one left the draft
/// exactly as it was.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DraftError {
    #[error("Select a material before adding it")]
    MissingMaterial,

    #[error("Material {0} is already in the group")]
    DuplicateMaterial(i64),

    #[error("Duration must be between 1 and 300 seconds, got {0}")]
    DurationOutOfRange(u32),

    #[error("No entry at position {0}")]
    IndexOutOfRange(usize),

    #[error("Select a group before adding a schedule")]
    MissingGroup,

    #[error("Invalid time {hour:02}:{minute:02}")]
    InvalidClock { hour: u8, minute: u8 },

    #[error("End time must be after start time")]
    EndNotAfterStart,

    #[error("Group {group_id} already has a schedule overlapping this window")]
    Overlap { group_id: i64, existing: usize },
}

/// Form fields that can carry a validation message
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Field {
    Name,
    Details,
    EndDate,
    Cabinets,
}

impl Field {
    pub fn as_str(self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Details => "details",
            Field::EndDate => "end_date",
            Field::Cabinets => "equipment_group",
        }
    }
}

/// Field errors collected by draft validation before any network call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(BTreeMap<Field, String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: Field, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: Field) -> bool {
        self.0.contains_key(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `Ok(())` when nothing was recorded
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", field.as_str(), message)?;
            first = false;
        }
        Ok(())
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Server error ({status}): {}", .message.as_deref().unwrap_or(GENERIC_FAILURE))]
    Server { status: u16, message: Option<String> },

    #[error("Request rejected: {}", .0.as_deref().unwrap_or(GENERIC_FAILURE))]
    Rejected(Option<String>),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error(transparent)]
    Draft(#[from] DraftError),

    #[error("Validation error: {0}")]
    Validation(ValidationErrors),

    #[error("Editor is {0}")]
    InvalidState(&'static str),
}

impl AppError {
    /// Message suitable for a dismissable notification.
    ///
    /// Server-provided text wins; transport failures collapse into the
    /// generic fallback.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Server { message: Some(msg), .. } | AppError::Rejected(Some(msg)) => {
                msg.clone()
            }
            AppError::Server { message: None, .. }
            | AppError::Rejected(None)
            | AppError::Http(_)
            | AppError::Json(_) => GENERIC_FAILURE.to_string(),
            AppError::Unauthorized => "Session expired, please log in again".to_string(),
            other => other.to_string(),
        }
    }

    /// Local validation failures never reach the network
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            AppError::Draft(_) | AppError::Validation(_) | AppError::InvalidState(_)
        )
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation(errors)
    }
}

/// Result type alias for application
pub type AppResult<T> = Result<T, AppError>;

/// Helper trait for converting Option to AppError::NotFound
pub trait OptionExt<T> {
    fn ok_or_not_found(self, msg: impl Into<String>) -> AppResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self, msg: impl Into<String>) -> AppResult<T> {
        self.ok_or_else(|| AppError::NotFound(msg.into()))
    }
}
