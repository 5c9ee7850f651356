//! Request field validation.
//!
//! Handlers receive loosely typed input (a JSON object, or multipart text
//! fields lifted into one) and run it through a [`Validator`], which records
//! every broken rule per field before anything is acted on.

use serde::Serialize;
use serde::ser::SerializeMap;
use serde_json::{Map, Value};

use stockroom_core::{Email, Price};

/// Field name to error messages, in the order fields were checked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: Vec<(String, Vec<String>)>,
}

impl ValidationErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A single error on a single field.
    #[must_use]
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Record an error for `field`.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        let message = message.into();
        if let Some((_, messages)) = self.fields.iter_mut().find(|(name, _)| name == field) {
            messages.push(message);
        } else {
            self.fields.push((field.to_owned(), vec![message]));
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Whether `field` has at least one error.
    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.fields.iter().any(|(name, _)| name == field)
    }

    /// Messages recorded for `field`.
    #[must_use]
    pub fn get(&self, field: &str) -> &[String] {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map_or(&[], |(_, messages)| messages.as_slice())
    }

    /// Total number of messages across all fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.iter().map(|(_, messages)| messages.len()).sum()
    }

    /// Summary line: the first message plus a count of the rest.
    #[must_use]
    pub fn summary(&self) -> String {
        let first = self
            .fields
            .first()
            .and_then(|(_, messages)| messages.first())
            .cloned()
            .unwrap_or_else(|| "The given data was invalid.".to_owned());
        match self.len().saturating_sub(1) {
            0 => first,
            1 => format!("{first} (and 1 more error)"),
            n => format!("{first} (and {n} more errors)"),
        }
    }

    /// `Ok(())` when nothing was recorded.
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one rule was broken.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl Serialize for ValidationErrors {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (field, messages) in &self.fields {
            map.serialize_entry(field, messages)?;
        }
        map.end()
    }
}

/// Outcome of reading one optional field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field<T> {
    /// Not sent, or sent with an invalid value (the error is recorded).
    Absent,
    /// Sent as `null` or an empty string.
    Null,
    Set(T),
}

impl<T> Field<T> {
    /// The value, if one was set.
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Set(value) => Some(value),
            Self::Absent | Self::Null => None,
        }
    }

    /// Patch semantics: `None` keeps the current value, `Some(None)` clears it.
    pub fn into_patch(self) -> Option<Option<T>> {
        match self {
            Self::Absent => None,
            Self::Null => Some(None),
            Self::Set(value) => Some(Some(value)),
        }
    }
}

/// Collects errors while reading fields out of request input.
///
/// Strings are trimmed and empty strings count as `null`.
pub struct Validator<'a> {
    input: &'a Map<String, Value>,
    errors: ValidationErrors,
}

impl<'a> Validator<'a> {
    #[must_use]
    pub fn new(input: &'a Map<String, Value>) -> Self {
        Self {
            input,
            errors: ValidationErrors::new(),
        }
    }

    /// The raw request input.
    #[must_use]
    pub const fn input(&self) -> &'a Map<String, Value> {
        self.input
    }

    /// Record an error that no field reader produced.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors.add(field, message);
    }

    /// Consume the validator.
    ///
    /// # Errors
    ///
    /// Returns every recorded error.
    pub fn finish(self) -> Result<(), ValidationErrors> {
        self.errors.into_result()
    }

    fn raw(&mut self, field: &str, required: bool) -> Option<&'a Value> {
        let value = self.input.get(field).filter(|value| match value {
            Value::Null => false,
            Value::String(s) => !s.trim().is_empty(),
            _ => true,
        });
        if value.is_none() && required {
            self.errors
                .add(field, format!("The {} field is required.", label(field)));
        }
        value
    }

    fn presence<T>(&mut self, field: &str, required: bool) -> Result<&'a Value, Field<T>> {
        let sent = self.input.contains_key(field);
        match self.raw(field, required) {
            Some(value) => Ok(value),
            None if sent && !required => Err(Field::Null),
            None => Err(Field::Absent),
        }
    }

    /// A string of at most `max` characters.
    pub fn string(&mut self, field: &str, required: bool, max: usize) -> Field<String> {
        let value = match self.presence(field, required) {
            Ok(value) => value,
            Err(outcome) => return outcome,
        };
        let Value::String(s) = value else {
            self.errors
                .add(field, format!("The {} field must be a string.", label(field)));
            return Field::Absent;
        };
        let s = s.trim();
        if s.chars().count() > max {
            self.errors.add(
                field,
                format!(
                    "The {} field must not be greater than {max} characters.",
                    label(field)
                ),
            );
            return Field::Absent;
        }
        Field::Set(s.to_owned())
    }

    /// A string taken verbatim (no trimming, no length cap), such as a
    /// password.
    pub fn secret(&mut self, field: &str, required: bool) -> Field<String> {
        let value = match self.presence(field, required) {
            Ok(value) => value,
            Err(outcome) => return outcome,
        };
        match value {
            Value::String(s) => Field::Set(s.clone()),
            _ => {
                self.errors
                    .add(field, format!("The {} field must be a string.", label(field)));
                Field::Absent
            }
        }
    }

    /// A valid email address of at most 255 characters.
    pub fn email(&mut self, field: &str, required: bool) -> Field<Email> {
        match self.string(field, required, Email::MAX_LENGTH) {
            Field::Set(s) => match Email::parse(&s) {
                Ok(email) => Field::Set(email),
                Err(_) => {
                    self.errors.add(
                        field,
                        format!("The {} field must be a valid email address.", label(field)),
                    );
                    Field::Absent
                }
            },
            Field::Null => Field::Null,
            Field::Absent => Field::Absent,
        }
    }

    /// A non-negative price with at most two fractional digits kept.
    pub fn price(&mut self, field: &str, required: bool) -> Field<Price> {
        let value = match self.presence(field, required) {
            Ok(value) => value,
            Err(outcome) => return outcome,
        };
        let text = match value {
            Value::Number(n) => n.to_string(),
            Value::String(s) => s.trim().to_owned(),
            _ => String::new(),
        };
        match Price::parse(&text) {
            Ok(price) => Field::Set(price),
            Err(stockroom_core::PriceError::NotANumber) => {
                self.errors
                    .add(field, format!("The {} field must be a number.", label(field)));
                Field::Absent
            }
            Err(stockroom_core::PriceError::Negative) => {
                self.errors
                    .add(field, format!("The {} field must be at least 0.", label(field)));
                Field::Absent
            }
            Err(stockroom_core::PriceError::TooLarge { max }) => {
                self.errors.add(
                    field,
                    format!("The {} field must not be greater than {max}.", label(field)),
                );
                Field::Absent
            }
        }
    }

    /// A whole number no smaller than `min`.
    pub fn integer(&mut self, field: &str, required: bool, min: i32) -> Field<i32> {
        let value = match self.presence(field, required) {
            Ok(value) => value,
            Err(outcome) => return outcome,
        };
        let parsed = match value {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        let Some(n) = parsed.and_then(|n| i32::try_from(n).ok()) else {
            self.errors
                .add(field, format!("The {} field must be an integer.", label(field)));
            return Field::Absent;
        };
        if n < min {
            self.errors.add(
                field,
                format!("The {} field must be at least {min}.", label(field)),
            );
            return Field::Absent;
        }
        Field::Set(n)
    }

    /// `true`/`false`, `1`/`0`, or their string forms.
    pub fn boolean(&mut self, field: &str) -> Field<bool> {
        let value = match self.presence(field, false) {
            Ok(value) => value,
            Err(outcome) => return outcome,
        };
        match value_as_bool(value) {
            Some(b) => Field::Set(b),
            None => {
                self.errors.add(
                    field,
                    format!("The {} field must be true or false.", label(field)),
                );
                Field::Absent
            }
        }
    }

    /// Whether `field` holds an affirmative value (`1`, `true`, `on`, `yes`).
    #[must_use]
    pub fn truthy(&self, field: &str) -> bool {
        match self.input.get(field) {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_i64() == Some(1),
            Some(Value::String(s)) => matches!(
                s.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "on" | "yes"
            ),
            _ => false,
        }
    }
}

fn value_as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        Value::String(s) => match s.trim() {
            "1" | "true" => Some(true),
            "0" | "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Human-readable field name used in messages.
#[must_use]
pub fn label(field: &str) -> String {
    field.replace('_', " ")
}
