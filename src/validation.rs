// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Form validation for user-supplied input.
//!
//! Every validator trims its input and returns the cleaned value, so callers
//! store exactly what was checked.

use crate::error::AppError;
use validator::ValidateEmail;

/// Minimum password length accepted at sign-up.
pub const MIN_PASSWORD_LEN: usize = 6;
/// Minimum length of an invite code as typed by a user.
pub const MIN_INVITE_CODE_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Email and password are required")]
    MissingCredentials,

    #[error("Please enter a valid email address")]
    InvalidEmail,

    #[error("Password must be at least 6 characters long")]
    WeakPassword,

    #[error("Please enter a trip name")]
    MissingTripName,

    #[error("Please enter a trip code")]
    MissingInviteCode,

    #[error("Invalid code format. Please check and try again.")]
    InvalidInviteCode,

    #[error("Please enter an activity")]
    MissingActivity,

    #[error("Please enter an item")]
    MissingPackingItem,

    #[error("Please enter a description")]
    MissingDescription,

    #[error("Please enter an amount")]
    MissingAmount,

    #[error("Please enter a valid amount")]
    InvalidAmount,
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

/// Credentials checked before they are sent to the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Validate sign-in input. Password strength is only enforced for new accounts.
pub fn credentials(
    email: &str,
    password: &str,
    new_account: bool,
) -> Result<Credentials, ValidationError> {
    let email = email.trim();
    if email.is_empty() || password.trim().is_empty() {
        return Err(ValidationError::MissingCredentials);
    }

    if !email.to_lowercase().validate_email() {
        return Err(ValidationError::InvalidEmail);
    }

    if new_account && password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::WeakPassword);
    }

    Ok(Credentials {
        email: email.to_string(),
        password: password.to_string(),
    })
}

pub fn trip_name(name: &str) -> Result<String, ValidationError> {
    required(name, ValidationError::MissingTripName)
}

/// Trim an optional free-text field, mapping blank to `None`.
pub fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Normalize an invite code for lookup. Codes are generated upper-case.
pub fn invite_code(code: &str) -> Result<String, ValidationError> {
    let code = code.trim();
    if code.is_empty() {
        return Err(ValidationError::MissingInviteCode);
    }
    if code.chars().count() < MIN_INVITE_CODE_LEN {
        return Err(ValidationError::InvalidInviteCode);
    }
    Ok(code.to_uppercase())
}

pub fn activity_text(text: &str) -> Result<String, ValidationError> {
    required(text, ValidationError::MissingActivity)
}

pub fn packing_text(text: &str) -> Result<String, ValidationError> {
    required(text, ValidationError::MissingPackingItem)
}

/// Validate an expense form, returning the trimmed description and parsed amount.
pub fn expense(desc: &str, amount: &str) -> Result<(String, f64), ValidationError> {
    let desc = required(desc, ValidationError::MissingDescription)?;
    let amount = amount.trim();
    if amount.is_empty() {
        return Err(ValidationError::MissingAmount);
    }

    let value: f64 = amount
        .parse()
        .map_err(|_| ValidationError::InvalidAmount)?;
    if !value.is_finite() || value <= 0.0 {
        return Err(ValidationError::InvalidAmount);
    }

    Ok((desc, value))
}

fn required(value: &str, missing: ValidationError) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        Err(missing)
    } else {
        Ok(value.to_string())
    }
}
