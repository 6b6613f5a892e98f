use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::form::{Field, FormFields, Mode};

pub const MIN_PASSWORD_LEN: usize = 6;

/// Message displayed in the submit slot when the server could not be reached
/// or did not say what went wrong.
pub const SERVER_ERROR: &str = "Server error";

/// Whitespace as understood by browsers for `\s` and `trim()`: ECMAScript
/// WhiteSpace and LineTerminator. Unlike Unicode White_Space it includes
/// U+FEFF and excludes U+0085.
const WHITESPACE_CLASS: &str = r"\t\n\x0B\x0C\r \x{A0}\x{1680}\x{2000}-\x{200A}\x{2028}\x{2029}\x{202F}\x{205F}\x{3000}\x{FEFF}";

fn is_whitespace(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n'
            | '\u{0B}'
            | '\u{0C}'
            | '\r'
            | ' '
            | '\u{A0}'
            | '\u{1680}'
            | '\u{2000}'..='\u{200A}'
            | '\u{2028}'
            | '\u{2029}'
            | '\u{202F}'
            | '\u{205F}'
            | '\u{3000}'
            | '\u{FEFF}'
    )
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let part = format!("[^@{}]+", WHITESPACE_CLASS);
        Regex::new(&format!(r"^{part}@{part}\.{part}$")).expect("Valid email pattern")
    })
}

fn phone_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9]{10,15}$").expect("Valid phone pattern"))
}

/// Reasons the form is currently invalid, per field, plus the non-field
/// submission slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: BTreeMap<Field, &'static str>,
    submit: Option<String>,
}

impl ValidationErrors {
    /// Errors holding only a submission failure.
    pub fn submission(message: impl Into<String>) -> Self {
        Self {
            fields: BTreeMap::new(),
            submit: Some(message.into()),
        }
    }

    pub fn get(&self, field: Field) -> Option<&'static str> {
        self.fields.get(&field).copied()
    }

    pub fn submit(&self) -> Option<&str> {
        self.submit.as_deref()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &'static str)> + '_ {
        self.fields.iter().map(|(f, e)| (*f, *e))
    }

    /// Forget the error of a single field, the others are left as is.
    pub fn clear_field(&mut self, field: Field) {
        self.fields.remove(&field);
    }

    pub fn has_field_errors(&self) -> bool {
        !self.fields.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.submit.is_none()
    }
}

fn check_email(email: &str) -> Option<&'static str> {
    if email.is_empty() {
        Some("Email is required")
    } else if !email_regex().is_match(email) {
        Some("Please enter a valid email address")
    } else {
        None
    }
}

/// The length is counted in UTF-16 code units, as browsers do.
fn check_password(password: &str) -> Option<&'static str> {
    if password.is_empty() {
        Some("Password is required")
    } else if password.encode_utf16().count() < MIN_PASSWORD_LEN {
        Some("Password must be at least 6 characters")
    } else {
        None
    }
}

fn check_full_name(full_name: &str) -> Option<&'static str> {
    full_name
        .trim_matches(is_whitespace)
        .is_empty()
        .then_some("Fullname is required")
}

fn check_phone(phone: &str) -> Option<&'static str> {
    if phone.is_empty() {
        Some("Phone is required")
    } else if !phone_regex().is_match(phone) {
        Some("Phone number must be 10 to 15 digits")
    } else {
        None
    }
}

fn check_confirm_password(confirm: &str, password: &str) -> Option<&'static str> {
    if confirm.is_empty() {
        Some("Confirm your password")
    } else if confirm != password {
        Some("Passwords do not match")
    } else {
        None
    }
}

/// Check the form values for the given mode.
///
/// Only the first failing rule of each field is reported. The form is valid
/// if and only if the returned errors are empty.
pub fn validate(fields: &FormFields, mode: Mode) -> ValidationErrors {
    let mut checks = vec![
        (Field::Email, check_email(&fields.email)),
        (Field::Password, check_password(&fields.password)),
    ];
    if mode == Mode::Register {
        checks.push((Field::FullName, check_full_name(&fields.full_name)));
        checks.push((Field::Phone, check_phone(&fields.phone)));
        checks.push((
            Field::ConfirmPassword,
            check_confirm_password(&fields.confirm_password, &fields.password),
        ));
    }

    ValidationErrors {
        fields: checks
            .into_iter()
            .filter_map(|(field, error)| error.map(|e| (field, e)))
            .collect(),
        submit: None,
    }
}
