//! Form checks that run before any request leaves the process.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use thiserror::Error;

use crate::models::AccountType;

/// 2 digits, 6 digits, 10 alphanumerics.
static UDIN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{2}[0-9]{6}[A-Za-z0-9]{10}$").expect("valid UDIN regex"));

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(&'static str),
    #[error("UDIN must be 18 characters: 2 digits, 6 digits, then 10 letters or digits")]
    InvalidUdin,
    #[error("{0} is not a valid date")]
    InvalidDate(&'static str),
    #[error("the signed certificate file must be attached")]
    MissingCertificate,
    #[error("end date must be after start date")]
    PeriodOrder,
    #[error("{0} is not a valid choice")]
    InvalidChoice(&'static str),
}

pub fn required(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ValidationError::Required(field))
    } else {
        Ok(trimmed.to_string())
    }
}

/// Trimmed value, or `None` when blank.
pub fn optional(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

pub fn is_valid_udin(udin: &str) -> bool {
    UDIN_PATTERN.is_match(udin)
}

pub fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, ValidationError> {
    let trimmed = required(field, value)?;
    NaiveDate::parse_from_str(&trimmed, "%Y-%m-%d").map_err(|_| ValidationError::InvalidDate(field))
}

pub fn parse_period(start: &str, end: &str) -> Result<(NaiveDate, NaiveDate), ValidationError> {
    let start = parse_date("start date", start)?;
    let end = parse_date("end date", end)?;
    if end <= start {
        return Err(ValidationError::PeriodOrder);
    }
    Ok((start, end))
}

/// A parent is required for heads and sub-heads and must be absent for categories.
pub fn account_parent(kind: AccountType, parent: Option<&str>) -> Result<Option<i64>, ValidationError> {
    let parsed = parent
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| p.parse::<i64>().map_err(|_| ValidationError::InvalidChoice("parent")))
        .transpose()?;
    match kind {
        AccountType::Category => Ok(None),
        _ => parsed.map(Some).ok_or(ValidationError::Required("parent")),
    }
}
