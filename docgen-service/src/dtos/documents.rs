use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use service_core::error::AppError;
use std::borrow::Cow;
use validator::{Validate, ValidationError};

/// Raw `POST /generate` input. Missing fields deserialize as empty strings
/// and are rejected by validation, not by the body parser.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct GenerateDocumentRequest {
    #[serde(default)]
    #[validate(
        custom(function = "validate_required"),
        length(max = 255, message = "The title field must not be greater than 255 characters.")
    )]
    pub title: String,
    #[serde(default)]
    #[validate(custom(function = "validate_calendar_date"))]
    pub date: String,
}

/// Input that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidDocumentRequest {
    pub title: String,
    /// Echoed into the document exactly as submitted (after trimming).
    pub date: String,
}

impl GenerateDocumentRequest {
    /// Trims both fields, then validates.
    pub fn into_valid(self) -> Result<ValidDocumentRequest, AppError> {
        let request = Self {
            title: self.title.trim().to_string(),
            date: self.date.trim().to_string(),
        };
        request.validate()?;
        Ok(ValidDocumentRequest {
            title: request.title,
            date: request.date,
        })
    }
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%B %d, %Y", "%d %B %Y"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

/// Accepts ISO dates and date-times (with or without offset), `YYYY/MM/DD`,
/// US `MM/DD/YYYY` and English month names. Impossible days such as
/// `2023-02-29` are rejected.
pub fn parse_calendar_date(value: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.date_naive())
        })
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
                .map(|dt| dt.date())
        })
}

fn validate_required(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some(Cow::from("The title field is required."));
        return Err(err);
    }
    Ok(())
}

fn validate_calendar_date(value: &str) -> Result<(), ValidationError> {
    let message = if value.is_empty() {
        "The date field is required."
    } else if parse_calendar_date(value).is_none() {
        "The date field must be a valid date."
    } else {
        return Ok(());
    };

    let mut err = ValidationError::new("date");
    err.message = Some(Cow::from(message));
    Err(err)
}
