use std::{collections::BTreeMap, fmt};

use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::{AppError, AppResult};

/// Substrings rejected in product names and descriptions, checked in this
/// order. The Russian list comes first; English equivalents follow.
pub const FORBIDDEN_WORDS: [&str; 18] = [
    "казино",
    "криптовалюта",
    "крипта",
    "биржа",
    "дешево",
    "бесплатно",
    "обман",
    "полиция",
    "радар",
    "casino",
    "cryptocurrency",
    "crypto",
    "exchange",
    "cheap",
    "free",
    "scam",
    "police",
    "radar",
];

pub const MIN_PASSWORD_LEN: usize = 8;

/// Form errors keyed by field name; form-level errors live under `__all__`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub const NON_FIELD: &'static str = "__all__";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn non_field(message: impl Into<String>) -> Self {
        Self::single(Self::NON_FIELD, message)
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn extend(&mut self, other: FieldErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_result(self) -> AppResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

pub fn find_forbidden_word(text: &str) -> Option<&'static str> {
    let folded = text.to_lowercase();
    FORBIDDEN_WORDS
        .into_iter()
        .find(|word| folded.contains(word))
}

pub fn check_forbidden_words(field: &str, text: &str, errors: &mut FieldErrors) {
    if let Some(word) = find_forbidden_word(text) {
        errors.add(field, format!("Forbidden word in {field}: {word}"));
    }
}

pub fn check_required(field: &str, value: &str, max_len: usize, errors: &mut FieldErrors) {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.add(field, "This field is required.");
    } else if trimmed.chars().count() > max_len {
        errors.add(
            field,
            format!("Ensure this value has at most {max_len} characters."),
        );
    }
}

/// Prices are stored as NUMERIC(10, 2).
pub fn check_price(field: &str, price: Decimal, errors: &mut FieldErrors) {
    if price.is_sign_negative() && !price.is_zero() {
        errors.add(field, "Ensure this value is greater than or equal to 0.");
    } else if price.normalize().scale() > 2 {
        errors.add(field, "Ensure that there are no more than 2 decimal places.");
    } else if price >= Decimal::new(100_000_000, 0) {
        errors.add(field, "Ensure that there are no more than 10 digits in total.");
    }
}

/// Trims the address and lowercases its domain part.
pub fn normalize_email(email: &str) -> Option<String> {
    let email = email.trim();
    let (local, domain) = email.rsplit_once('@')?;
    if local.is_empty() || domain.is_empty() || domain.contains(char::is_whitespace) {
        return None;
    }
    Some(format!("{local}@{}", domain.to_lowercase()))
}

pub fn check_email(field: &str, email: &str, errors: &mut FieldErrors) -> Option<String> {
    let normalized = normalize_email(email);
    if normalized.is_none() {
        errors.add(field, "Enter a valid email address.");
    }
    normalized
}

/// Password + confirmation pair; the mismatch is reported on `confirm_field`.
pub fn check_new_password(
    confirm_field: &str,
    password: &str,
    confirmation: &str,
    errors: &mut FieldErrors,
) {
    if password != confirmation {
        errors.add(confirm_field, "The two password fields didn't match.");
    } else if password.chars().count() < MIN_PASSWORD_LEN {
        errors.add(
            confirm_field,
            format!("This password is too short. It must contain at least {MIN_PASSWORD_LEN} characters."),
        );
    }
}
