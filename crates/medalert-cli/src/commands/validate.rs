use chrono::{DateTime, Utc};
use medalert_core::validation::{validate_alert_form, AlertForm, FieldErrors};

use crate::error::CliError;

pub fn check_alert(title: &str, date: &str, time: &str) -> Result<DateTime<Utc>, CliError> {
    let form = AlertForm {
        title: title.to_string(),
        scheduled_date: date.to_string(),
        scheduled_time: time.to_string(),
    };

    let errors = validate_alert_form(&form);
    if !errors.is_empty() {
        return Err(CliError::InvalidAlert(format_field_errors(&errors)));
    }

    form.scheduled_at()
        .ok_or_else(|| CliError::InvalidAlert("scheduled date and time are unreadable".to_string()))
}

pub fn run_validate_alert(title: &str, date: &str, time: &str) -> Result<(), CliError> {
    let scheduled_at = check_alert(title, date, time)?;
    println!("{}", scheduled_at.to_rfc3339());
    Ok(())
}

pub fn format_field_errors(errors: &FieldErrors) -> String {
    errors
        .iter()
        .map(|(field, message)| format!("  {field}: {message}"))
        .collect::<Vec<_>>()
        .join("\n")
}
