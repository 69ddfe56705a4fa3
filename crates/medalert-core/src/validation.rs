//! Form input validation

use std::collections::BTreeMap;
use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Field name to error message; empty when the form is valid
pub type FieldErrors = BTreeMap<&'static str, &'static str>;

const DATE_FORMAT_MESSAGE: &str = "Invalid format. Use YYYY-MM-DD";
const CONSULTATION: &str = "consultation";

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Invalid regex"))
}

fn date_regex() -> &'static Regex {
    static DATE: OnceLock<Regex> = OnceLock::new();
    DATE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("Invalid regex"))
}

fn time_regex() -> &'static Regex {
    static TIME: OnceLock<Regex> = OnceLock::new();
    TIME.get_or_init(|| Regex::new(r"^\d{2}:\d{2}$").expect("Invalid regex"))
}

pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email)
}

/// Ten digits once punctuation and spaces are stripped
pub fn is_valid_phone(phone: &str) -> bool {
    phone.chars().filter(char::is_ascii_digit).count() == 10
}

/// `YYYY-MM-DD` naming a real calendar day
pub fn is_valid_date(date: &str) -> bool {
    parse_date(date).is_some()
}

/// `HH:MM` on a 24-hour clock
pub fn is_valid_time(time: &str) -> bool {
    parse_time(time).is_some()
}

fn parse_date(date: &str) -> Option<NaiveDate> {
    if !date_regex().is_match(date) {
        return None;
    }
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

fn parse_time(time: &str) -> Option<NaiveTime> {
    if !time_regex().is_match(time) {
        return None;
    }
    NaiveTime::parse_from_str(time, "%H:%M").ok()
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PatientForm {
    pub first_name: String,
    pub last_name: String,
    pub birth_date: String,
    pub phone: String,
    pub email: String,
}

pub fn validate_patient_form(form: &PatientForm) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if is_blank(&form.first_name) {
        errors.insert("firstName", "First name is required");
    }
    if is_blank(&form.last_name) {
        errors.insert("lastName", "Last name is required");
    }

    if is_blank(&form.birth_date) {
        errors.insert("birthDate", "Birth date is required");
    } else if !is_valid_date(&form.birth_date) {
        errors.insert("birthDate", DATE_FORMAT_MESSAGE);
    }

    if is_blank(&form.phone) {
        errors.insert("phone", "Phone is required");
    } else if !is_valid_phone(&form.phone) {
        errors.insert("phone", "Invalid phone number");
    }

    if !form.email.is_empty() && !is_valid_email(&form.email) {
        errors.insert("email", "Invalid email address");
    }

    errors
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RecordForm {
    #[serde(rename = "type")]
    pub record_type: String,
    pub title: String,
    pub date: String,
    pub diagnosis: String,
    pub follow_up_date: String,
}

/// Validate a clinical record form; `has_patient` is whether one was selected
pub fn validate_record_form(form: &RecordForm, has_patient: bool) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if !has_patient {
        errors.insert("patient", "A patient must be selected");
    }
    if form.record_type.is_empty() {
        errors.insert("type", "Record type is required");
    }
    if is_blank(&form.title) {
        errors.insert("title", "Title is required");
    }

    if is_blank(&form.date) {
        errors.insert("date", "Date is required");
    } else if !is_valid_date(&form.date) {
        errors.insert("date", DATE_FORMAT_MESSAGE);
    }

    if is_blank(&form.diagnosis) && form.record_type == CONSULTATION {
        errors.insert("diagnosis", "Diagnosis is required for consultations");
    }

    if !form.follow_up_date.is_empty() && !is_valid_date(&form.follow_up_date) {
        errors.insert("followUpDate", DATE_FORMAT_MESSAGE);
    }

    errors
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AlertForm {
    pub title: String,
    pub scheduled_date: String,
    pub scheduled_time: String,
}

impl AlertForm {
    /// Combined date and time as a UTC instant, when both are valid
    pub fn scheduled_at(&self) -> Option<DateTime<Utc>> {
        let date = parse_date(self.scheduled_date.trim())?;
        let time = parse_time(self.scheduled_time.trim())?;
        Some(date.and_time(time).and_utc())
    }
}

pub fn validate_alert_form(form: &AlertForm) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if is_blank(&form.title) {
        errors.insert("title", "Title is required");
    }

    if is_blank(&form.scheduled_date) {
        errors.insert("scheduledDate", "Date is required");
    } else if !is_valid_date(&form.scheduled_date) {
        errors.insert("scheduledDate", DATE_FORMAT_MESSAGE);
    }

    if is_blank(&form.scheduled_time) {
        errors.insert("scheduledTime", "Time is required");
    } else if !is_valid_time(&form.scheduled_time) {
        errors.insert("scheduledTime", "Invalid format. Use HH:MM");
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn email_needs_user_domain_and_suffix() {
        assert!(is_valid_email("nurse@clinic.mx"));
        assert!(!is_valid_email("nurse@clinic"));
        assert!(!is_valid_email("nurse clinic@x.mx"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn phone_counts_digits_after_stripping_formatting() {
        assert!(is_valid_phone("(55) 1234-5678"));
        assert!(!is_valid_phone("55 1234 567"));
        assert!(!is_valid_phone(""));
    }

    #[test]
    fn date_must_be_real_calendar_day() {
        assert!(is_valid_date("2024-02-29"));
        assert!(!is_valid_date("2025-02-29"));
        assert!(!is_valid_date("2025-13-01"));
        assert!(!is_valid_date("2025-1-01"));
    }

    #[test]
    fn time_must_be_24_hour_clock() {
        assert!(is_valid_time("00:00"));
        assert!(is_valid_time("23:59"));
        assert!(!is_valid_time("24:00"));
        assert!(!is_valid_time("12:60"));
        assert!(!is_valid_time("9:30"));
    }

    #[test]
    fn patient_form_reports_each_invalid_field() {
        let errors = validate_patient_form(&PatientForm {
            first_name: "Ana".to_string(),
            last_name: " ".to_string(),
            birth_date: "1990-02-30".to_string(),
            phone: "5512345678".to_string(),
            email: "ana@".to_string(),
        });
        assert_eq!(
            errors.keys().copied().collect::<Vec<_>>(),
            vec!["birthDate", "email", "lastName"]
        );
    }

    #[test]
    fn record_form_requires_diagnosis_for_consultations() {
        let form = RecordForm {
            record_type: "consultation".to_string(),
            title: "Checkup".to_string(),
            date: "2025-03-05".to_string(),
            ..RecordForm::default()
        };
        let errors = validate_record_form(&form, true);
        assert_eq!(errors.keys().copied().collect::<Vec<_>>(), vec!["diagnosis"]);

        let lab = RecordForm {
            record_type: "lab".to_string(),
            follow_up_date: "soon".to_string(),
            ..form
        };
        let errors = validate_record_form(&lab, false);
        assert_eq!(
            errors.keys().copied().collect::<Vec<_>>(),
            vec!["followUpDate", "patient"]
        );
    }

    #[test]
    fn alert_form_combines_date_and_time() {
        let form = AlertForm {
            title: "Insulin".to_string(),
            scheduled_date: "2025-03-05".to_string(),
            scheduled_time: "08:30".to_string(),
        };
        assert!(validate_alert_form(&form).is_empty());
        assert_eq!(
            form.scheduled_at(),
            Some(Utc.with_ymd_and_hms(2025, 3, 5, 8, 30, 0).unwrap())
        );

        let errors = validate_alert_form(&AlertForm::default());
        assert_eq!(errors.len(), 3);
        assert_eq!(errors["scheduledTime"], "Time is required");
    }
}
