//! Key-case translation between wire-format and in-process JSON trees.
//!
//! Hosted tables expose snake_case column names while application records
//! use camelCase field names. [`keys_to_camel`] and [`keys_to_snake`]
//! rewrite every object key in a JSON tree, recursing through nested
//! objects and arrays. Scalar values, including date strings, are never
//! touched; only keys are renamed.

use serde_json::Value;

/// Converts a snake_case or kebab-case key to camelCase.
///
/// A separator (`_` or `-`) followed by an ASCII letter is dropped and the
/// letter upper-cased. Separators before digits or at the end of the key
/// are kept verbatim, so [`to_snake`] round-trips keys that were camelCase
/// to begin with.
///
/// # Examples
///
/// ```
/// assert_eq!(keycase::to_camel("student_id"), "studentId");
/// assert_eq!(keycase::to_camel("membership-paid"), "membershipPaid");
/// ```
#[must_use]
pub fn to_camel(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut chars = key.chars().peekable();
    while let Some(current) = chars.next() {
        let starts_word = matches!(current, '_' | '-')
            && chars.peek().is_some_and(char::is_ascii_alphabetic);
        if starts_word {
            if let Some(letter) = chars.next() {
                out.push(letter.to_ascii_uppercase());
            }
        } else {
            out.push(current);
        }
    }
    out
}

/// Converts a camelCase key to snake_case.
///
/// Every ASCII uppercase letter becomes an underscore followed by its
/// lowercase form. Keys without uppercase letters pass through unchanged.
///
/// # Examples
///
/// ```
/// assert_eq!(keycase::to_snake("studentId"), "student_id");
/// assert_eq!(keycase::to_snake("createdAt"), "created_at");
/// ```
#[must_use]
pub fn to_snake(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for current in key.chars() {
        if current.is_ascii_uppercase() {
            out.push('_');
            out.push(current.to_ascii_lowercase());
        } else {
            out.push(current);
        }
    }
    out
}

/// Renames every object key in `value` to camelCase, recursively.
///
/// # Examples
///
/// ```
/// use serde_json::json;
///
/// let row = json!({"student_id": "S-042", "membership_paid": true});
/// assert_eq!(
///     keycase::keys_to_camel(row),
///     json!({"studentId": "S-042", "membershipPaid": true}),
/// );
/// ```
#[must_use]
pub fn keys_to_camel(value: Value) -> Value {
    rename_keys(value, to_camel)
}

/// Renames every object key in `value` to snake_case, recursively.
///
/// # Examples
///
/// ```
/// use serde_json::json;
///
/// let record = json!({"membershipExpiry": "2099-12-31"});
/// assert_eq!(
///     keycase::keys_to_snake(record),
///     json!({"membership_expiry": "2099-12-31"}),
/// );
/// ```
#[must_use]
pub fn keys_to_snake(value: Value) -> Value {
    rename_keys(value, to_snake)
}

fn rename_keys<F>(value: Value, rename: F) -> Value
where
    F: Fn(&str) -> String + Copy,
{
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, inner)| (rename(&key), rename_keys(inner, rename)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| rename_keys(item, rename))
                .collect(),
        ),
        other => other,
    }
}
