//! # Form Validation
//!
//! Client-side checks that run before any network call. Failures come back as
//! `AppError::Validation` carrying the exact text shown inline.
//!
//! ## Usage
//!
//! ```rust
//! use time_capsule_client::validation::FormValidation;
//!
//! assert!(FormValidation::validate_new_password("s3cret-pass", "s3cret-pass", 8).is_ok());
//! assert!(FormValidation::validate_new_password("short", "short", 8).is_err());
//! ```

use crate::constants::{MEDIA_ACCEPT_FILTER, MSG_PASSWORDS_MISMATCH};
use crate::errors::{AppError, AppResult};

/// Stateless validators for the account and capsule forms.
pub struct FormValidation;

impl FormValidation {
    /// Confirmation must match the password exactly.
    pub fn validate_password_match(password: &str, confirmation: &str) -> AppResult<()> {
        if password != confirmation {
            return Err(AppError::Validation(MSG_PASSWORDS_MISMATCH.to_string()));
        }
        Ok(())
    }

    /// Length is counted in characters, not bytes.
    pub fn validate_password_length(password: &str, min_length: usize) -> AppResult<()> {
        if password.chars().count() < min_length {
            return Err(AppError::Validation(format!(
                "Password must be at least {} characters long.",
                min_length
            )));
        }
        Ok(())
    }

    /// Match first, then length, as the registration and reset forms report them.
    pub fn validate_new_password(
        password: &str,
        confirmation: &str,
        min_length: usize,
    ) -> AppResult<()> {
        Self::validate_password_match(password, confirmation)?;
        Self::validate_password_length(password, min_length)
    }

    /// Rejects blank input for a required field.
    pub fn validate_required(label: &str, value: &str) -> AppResult<()> {
        if value.trim().is_empty() {
            return Err(AppError::Validation(format!("{} is required.", label)));
        }
        Ok(())
    }

    /// Whether a file would pass the picker's `accept` filter.
    ///
    /// Advisory only: the wizard never rejects a file on this basis.
    pub fn matches_accept_filter(file_name: &str, mime_type: &str) -> bool {
        let extension = file_name
            .rsplit_once('.')
            .map(|(_, ext)| format!(".{}", ext.to_ascii_lowercase()));

        MEDIA_ACCEPT_FILTER.split(',').any(|pattern| {
            if let Some(prefix) = pattern.strip_suffix("/*") {
                mime_type
                    .split_once('/')
                    .is_some_and(|(top, _)| top.eq_ignore_ascii_case(prefix))
            } else if pattern.starts_with('.') {
                extension.as_deref() == Some(pattern)
            } else {
                mime_type.eq_ignore_ascii_case(pattern)
            }
        })
    }
}
