//! Screenplan - advertising screen scheduling for power-bank rental cabinets
//!
//! This crate models advertising materials, groups (ordered playlists of
//! materials) and plans (dated campaigns playing groups in daily windows on
//! a set of cabinets), enforces the rules on drafts of those entities, and
//! talks to the rental backend to load and save them.

pub mod client;
pub mod composer;
pub mod config;
pub mod draft;
pub mod editor;
pub mod entity;
pub mod error;
pub mod session;
pub mod state;

// Re-export commonly used types
pub use client::{ApiClient, ScreenApi};
pub use config::Config;
pub use draft::{Draft, GroupDraft, PlanDraft};
pub use editor::{Editor, SubmitOutcome};
pub use error::{AppError, AppResult, DraftError};
pub use state::AppState;
