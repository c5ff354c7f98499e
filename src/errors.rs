//! Unified error types for the campus desk core.
//!
//! Every operation returns [`Result`]. Expected conditions (no signed-in user, a form
//! that fails validation) are ordinary variants rather than panics, and each variant
//! can be turned into the text shown to an end user with [`Error::user_message`].

use crate::entities::consultation::ConsultationStatus;
use sea_orm::DbErr;
use thiserror::Error;

/// Generic message shown when the document store fails.
pub const STORE_FAILURE_MESSAGE: &str =
    "Something went wrong while talking to the server. Please try again.";

/// Generic message shown when order submission fails.
pub const SUBMISSION_FAILURE_MESSAGE: &str = "We could not place your order. Please try again.";

/// All errors produced by the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// A mutating consultation operation was attempted with no signed-in user.
    #[error("Authentication required")]
    AuthenticationRequired,

    /// A form or patch failed validation. `message` names the first violated rule.
    #[error("Validation failed: {message}")]
    Validation {
        /// Human-readable description of the violated rule
        message: String,
    },

    /// Any failure from the underlying document store.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// The consultation targeted by an update does not exist.
    #[error("Consultation not found: {id}")]
    ConsultationNotFound {
        /// Id that was looked up
        id: i64,
    },

    /// A status change that the consultation lifecycle does not allow.
    #[error("Cannot move consultation from {from} to {to}")]
    InvalidTransition {
        /// Current status
        from: ConsultationStatus,
        /// Requested status
        to: ConsultationStatus,
    },

    /// Rating outside the 1-5 range.
    #[error("Invalid rating: {rating}")]
    InvalidRating {
        /// Rejected rating
        rating: i32,
    },

    /// Rating or feedback attached to a consultation that is not completed.
    #[error("Cannot rate a consultation that is {status}")]
    RatingNotAllowed {
        /// Status the consultation would have
        status: ConsultationStatus,
    },

    /// Device-local storage failed.
    #[error("Local storage error: {message}")]
    Storage {
        /// What went wrong
        message: String,
    },

    /// Cart or wishlist snapshot could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration could not be read or parsed.
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The (simulated) order submission failed.
    #[error("Order submission failed: {message}")]
    Submission {
        /// Internal description of the failure
        message: String,
    },
}

impl Error {
    /// Text suitable for showing to the person who triggered the operation.
    ///
    /// Validation failures show their rule; store and submission failures are reduced
    /// to a generic message so internal details never reach the page.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::AuthenticationRequired => "Please sign in to continue.".to_string(),
            Self::Validation { message } => message.clone(),
            Self::ConsultationNotFound { .. } => "This consultation no longer exists.".to_string(),
            Self::InvalidTransition { .. }
            | Self::InvalidRating { .. }
            | Self::RatingNotAllowed { .. } => self.to_string(),
            Self::Submission { .. } => SUBMISSION_FAILURE_MESSAGE.to_string(),
            Self::Database(_)
            | Self::Storage { .. }
            | Self::Serialization(_)
            | Self::Config { .. }
            | Self::Io(_) => STORE_FAILURE_MESSAGE.to_string(),
        }
    }

    /// Shorthand for a [`Error::Validation`] value.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
