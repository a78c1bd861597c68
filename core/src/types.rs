//! Domain DTOs for the employee API.
//!
//! # Design
//! Server records are read leniently: every attribute except `id` is
//! optional, reference fields accept numbers or strings, and attributes this
//! crate does not model are kept in `extra` so nothing is lost when a record
//! is cached and handed back to the UI.
//!
//! Request payloads are the opposite: typed, with required fields enforced by
//! the type and by `validate()` before any request is built.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::http::FilePart;

/// A reference to another entity (role, team, team lead, manager).
///
/// The backend is inconsistent about encoding these as numbers or strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IdRef {
    Int(i64),
    Text(String),
}

impl fmt::Display for IdRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdRef::Int(n) => write!(f, "{n}"),
            IdRef::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for IdRef {
    fn from(n: i64) -> Self {
        IdRef::Int(n)
    }
}

impl From<&str> for IdRef {
    fn from(s: &str) -> Self {
        IdRef::Text(s.to_string())
    }
}

/// A single employee as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeRecord {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_num: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emergency_phone_num: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_id: Option<IdRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<IdRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tl_id: Option<IdRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pm_id: Option<IdRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_pic: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EmployeeRecord {
    /// A record carrying only an id and a name.
    pub fn named(id: u64, name: &str) -> Self {
        Self {
            id,
            name: Some(name.to_string()),
            employee_id: None,
            email: None,
            address: None,
            phone_num: None,
            emergency_phone_num: None,
            role_id: None,
            team_id: None,
            tl_id: None,
            pm_id: None,
            profile_pic: None,
            extra: Map::new(),
        }
    }
}

/// Minimal projection used by team-lead pickers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamLeadRecord {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Payload for creating an employee.
///
/// `role_id`/`roles` and `team_id`/`team` are alternatives: the identifier
/// wins when present, otherwise the raw value is sent.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewEmployee {
    pub name: String,
    pub employee_id: String,
    pub email: String,
    pub password: String,
    pub address: String,
    pub phone_num: String,
    pub emergency_phone_num: String,
    pub tl_id: Option<String>,
    pub role_id: Option<String>,
    pub roles: Option<String>,
    pub team_id: Option<String>,
    pub team: Option<String>,
    #[serde(skip)]
    pub profile_pic: Option<FilePart>,
}

impl NewEmployee {
    pub fn validate(&self) -> Result<(), ApiError> {
        require("name", &self.name)?;
        require("email", &self.email)
    }
}

/// What an update does to the stored profile image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ImageChange {
    /// Leave the current image untouched; the field is omitted.
    #[default]
    Keep,
    /// Remove the current image; the field is sent as an empty string.
    Clear,
    /// Upload a new image, compressed before sending.
    Replace(FilePart),
}

/// Payload for updating an employee. Absent optional fields are sent as
/// empty strings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EmployeeUpdate {
    pub name: String,
    pub email: String,
    pub phone_num: Option<String>,
    pub emergency_phone_num: Option<String>,
    pub address: Option<String>,
    pub team_id: Option<String>,
    pub role_id: Option<String>,
    pub pm_id: Option<String>,
    #[serde(skip)]
    pub profile_pic: ImageChange,
}

impl EmployeeUpdate {
    pub fn validate(&self) -> Result<(), ApiError> {
        require("name", &self.name)?;
        require("email", &self.email)
    }
}

fn require(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::Validation(format!("The {field} field is required.")));
    }
    Ok(())
}

/// Success envelope: `{ "data": ... }`.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub data: Option<T>,
}

/// Failure body: `{ "message": ... }` and/or `{ "errors": { field: [msg] } }`.
#[derive(Debug, Default, Deserialize)]
pub struct ServerError {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub errors: Option<Map<String, Value>>,
}

impl ServerError {
    /// Parse a failure body; anything that is not a JSON object yields an
    /// empty error so callers fall through to their fallback message.
    pub fn from_body(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_default()
    }

    /// First message of the first field in `errors`, in server order.
    pub fn first_field_error(&self) -> Option<String> {
        let (_, first) = self.errors.as_ref()?.iter().next()?;
        let msg = match first {
            Value::Array(items) => items.first()?,
            other => other,
        };
        match msg {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    /// Non-empty top-level message.
    pub fn message(&self) -> Option<String> {
        self.message.clone().filter(|m| !m.is_empty())
    }
}
