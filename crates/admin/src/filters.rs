//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Renders blank values as a dash in table cells.
///
/// Usage in templates: `{{ contact.phone|or_dash }}`
#[askama::filter_fn]
pub fn or_dash(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(dash_if_blank(&value.to_string()))
}

fn dash_if_blank(value: &str) -> String {
    if value.trim().is_empty() {
        "\u{2014}".to_owned()
    } else {
        value.to_owned()
    }
}
