use chrono::{Datelike, Local, NaiveDate};

use crate::model::PatientFormData;

/// Upper bound accepted by `calculate_birthdate_from_age`.
pub const MAX_AGE: i64 = 150;

/// Parse `YYYY-MM-DD`, or the date part of an ISO datetime such as
/// `1988-05-15T00:00:00.000+0000`.
pub fn parse_iso_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    let (date_part, time_part) = value.split_at_checked(10)?;
    if !(time_part.starts_with('T') || time_part.starts_with(' ')) {
        return None;
    }
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Whole years elapsed from `birthdate` to today. Never negative; 0 for
/// unparseable input.
pub fn calculate_age(birthdate: &str) -> u32 {
    calculate_age_on(birthdate, today())
}

pub fn calculate_age_on(birthdate: &str, today: NaiveDate) -> u32 {
    parse_iso_date(birthdate)
        .and_then(|birth| today.years_since(birth))
        .unwrap_or(0)
}

/// January 1st of `current year - age`, or an empty string when `age` is
/// outside 0..=150.
pub fn calculate_birthdate_from_age(age: i64) -> String {
    calculate_birthdate_from_age_on(age, today())
}

pub fn calculate_birthdate_from_age_on(age: i64, today: NaiveDate) -> String {
    if !(0..=MAX_AGE).contains(&age) {
        return String::new();
    }
    let Ok(years) = i32::try_from(age) else {
        return String::new();
    };
    NaiveDate::from_ymd_opt(today.year() - years, 1, 1)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// `DD/MM/YYYY`, or an empty string when the input is not a date.
pub fn format_date_for_display(value: &str) -> String {
    parse_iso_date(value)
        .map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_default()
}

/// Trim names and drop identifiers/attributes left blank. Returns a new
/// form; the input is not touched.
pub fn sanitize_form_data(form: &PatientFormData) -> PatientFormData {
    let mut sanitized = form.clone();
    sanitized.given_name = form.given_name.trim().to_string();
    sanitized.middle_name = form.middle_name.trim().to_string();
    sanitized.family_name = form.family_name.trim().to_string();

    sanitized.identifiers = form
        .identifiers
        .iter()
        .filter(|id| !id.identifier.trim().is_empty())
        .map(|id| {
            let mut id = id.clone();
            id.identifier = id.identifier.trim().to_string();
            id
        })
        .collect();

    sanitized.attributes = form
        .attributes
        .iter()
        .filter(|attr| !attr.value.trim().is_empty())
        .map(|attr| {
            let mut attr = attr.clone();
            attr.value = attr.value.trim().to_string();
            attr
        })
        .collect();

    sanitized
}
