//! Per-field validation failures

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use validator::{ValidationError, ValidationErrors, ValidationErrorsKind};

/// Validation failures keyed by dotted field path (`destinations.0.name`).
///
/// Every offending field is kept so a single response can enumerate all of
/// them instead of stopping at the first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Append every message from `other`.
    pub fn merge(&mut self, other: FieldErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    /// Append messages from `other` only for fields that have none yet.
    ///
    /// Used when decode errors (e.g. a non-numeric duration) must win over
    /// the semantic errors the placeholder value would also trigger.
    pub fn merge_absent(&mut self, other: FieldErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_insert(messages);
        }
    }

    /// Rewrite positional `list.N` paths to `list.keys[N]`.
    ///
    /// Lists decoded from sparse form keys are validated by position; this
    /// maps each error back to the index the client sent.
    pub fn reindex(self, list: &str, keys: &[usize]) -> FieldErrors {
        let prefix = format!("{}.", list);
        let mut fields = FieldErrors::new();
        for (field, messages) in self.0 {
            let path = field
                .strip_prefix(&prefix)
                .and_then(|rest| {
                    let (position, tail) = match rest.split_once('.') {
                        Some((position, tail)) => (position, Some(tail)),
                        None => (rest, None),
                    };
                    let key = keys.get(position.parse::<usize>().ok()?)?;
                    Some(match tail {
                        Some(tail) => format!("{}{}.{}", prefix, key, tail),
                        None => format!("{}{}", prefix, key),
                    })
                })
                .unwrap_or(field);
            fields.0.entry(path).or_default().extend(messages);
        }
        fields
    }

    /// `Ok(())` when empty, otherwise a validation error carrying every field.
    pub fn into_result(self) -> crate::error::Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(crate::error::AppError::Validation(self))
        }
    }

    /// One-line human summary of the first failing field
    pub fn summary(&self) -> String {
        match self.0.iter().next() {
            Some((field, messages)) => {
                let first = messages.first().map(String::as_str).unwrap_or("is invalid");
                if self.0.len() > 1 {
                    format!("{}: {} (and {} more)", field, first, self.0.len() - 1)
                } else {
                    format!("{}: {}", field, first)
                }
            }
            None => "The given data was invalid.".to_string(),
        }
    }

    fn collect(&mut self, prefix: Option<&str>, errors: &ValidationErrors) {
        for (field, kind) in errors.errors() {
            let path = match prefix {
                Some(prefix) => format!("{}.{}", prefix, field),
                None => field.to_string(),
            };
            match kind {
                ValidationErrorsKind::Field(list) => {
                    for error in list {
                        self.add(path.clone(), describe(error));
                    }
                }
                ValidationErrorsKind::Struct(nested) => self.collect(Some(&path), nested),
                ValidationErrorsKind::List(items) => {
                    for (index, nested) in items {
                        self.collect(Some(&format!("{}.{}", path, index)), nested);
                    }
                }
            }
        }
    }
}

impl From<ValidationErrors> for FieldErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields = FieldErrors::new();
        fields.collect(None, &errors);
        fields
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
                write!(f, "{}: {}", field, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

fn describe(error: &ValidationError) -> String {
    if let Some(message) = &error.message {
        return message.to_string();
    }
    let param = |name: &str| error.params.get(name).map(|v| v.to_string());
    match error.code.as_ref() {
        "required" => "This field is required.".to_string(),
        "email" => "Must be a valid email address.".to_string(),
        "must_match" => "Confirmation does not match.".to_string(),
        "length" => match (param("min"), param("max")) {
            (Some(min), Some(max)) => format!("Length must be between {} and {}.", min, max),
            (Some(min), None) => format!("Length must be at least {}.", min),
            (None, Some(max)) => format!("Length may not be greater than {}.", max),
            (None, None) => "Invalid length.".to_string(),
        },
        "range" => match param("min") {
            Some(min) => format!("Must be at least {}.", min),
            None => "Out of range.".to_string(),
        },
        other => format!("Is invalid ({}).", other),
    }
}
