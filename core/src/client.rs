//! Stateless HTTP request builder and response parser for the employee API.
//!
//! # Design
//! `EmployeeClient` holds only a `base_url` and carries no mutable state
//! between calls. Each operation is split into a `build_*` method that
//! produces an `HttpRequest` and a `parse_*` method that consumes an
//! `HttpResponse`. `EmployeeStore` drives the round-trip in between.
//!
//! Field derivation for create and update lives here because it decides the
//! exact multipart body the backend sees.

use crate::error::ApiError;
use crate::http::{Body, FormData, HttpMethod, HttpRequest, HttpResponse};
use crate::types::{EmployeeRecord, EmployeeUpdate, Envelope, ImageChange, NewEmployee, ServerError, TeamLeadRecord};

/// Role ids that never belong to a team.
pub const PRIVILEGED_ROLES: [f64; 4] = [1.0, 2.0, 3.0, 4.0];

pub const LIST_FALLBACK: &str = "Failed to fetch employees";
pub const TEAM_LEADS_FALLBACK: &str = "Failed to fetch team leads";
pub const MUTATION_FALLBACK: &str = "Something went wrong";
pub const DELETE_FALLBACK: &str = "Failed to delete employee";

/// Synchronous, stateless client for the employee API.
#[derive(Debug, Clone)]
pub struct EmployeeClient {
    base_url: String,
}

impl EmployeeClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn build_list_employees(&self, token: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: format!("{}/api/users", self.base_url),
            headers: json_headers(token),
            body: Body::Empty,
        }
    }

    pub fn build_list_team_leads(&self, token: &str, team_id: &str) -> HttpRequest {
        let team_id: String = url::form_urlencoded::byte_serialize(team_id.as_bytes()).collect();
        HttpRequest {
            method: HttpMethod::Get,
            url: format!("{}/api/getalltl?team_id={team_id}", self.base_url),
            headers: json_headers(token),
            body: Body::Empty,
        }
    }

    pub fn build_create_employee(&self, token: &str, input: &NewEmployee) -> Result<HttpRequest, ApiError> {
        input.validate()?;

        let mut form = FormData::new();
        form.text("name", input.name.as_str())
            .text("employee_id", input.employee_id.as_str())
            .text("email", input.email.as_str())
            .text("password", input.password.as_str())
            .text("address", input.address.as_str())
            .text("phone_num", input.phone_num.as_str())
            .text("emergency_phone_num", input.emergency_phone_num.as_str())
            .text("tl_id", input.tl_id.clone().unwrap_or_default());

        let role_id = input.role_id.as_deref().filter(|r| !r.trim().is_empty());
        match role_id {
            Some(role_id) => form.text("role_id", role_id),
            None => form.text("roles", input.roles.clone().unwrap_or_default()),
        };

        if is_privileged_role(role_id) {
            form.text("team_id", "");
        } else if let Some(team_id) = &input.team_id {
            form.text("team_id", team_id.as_str());
        } else {
            form.text("team", input.team.clone().unwrap_or_default());
        }

        if let Some(pic) = &input.profile_pic {
            form.file("profile_pic", pic.clone());
        }

        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: format!("{}/api/users", self.base_url),
            headers: bearer(token),
            body: Body::Multipart(form),
        })
    }

    /// Builds the update request. An `ImageChange::Replace` file is attached
    /// as given; compression happens before this call.
    pub fn build_update_employee(&self, token: &str, id: u64, input: &EmployeeUpdate) -> Result<HttpRequest, ApiError> {
        input.validate()?;

        let or_empty = |v: &Option<String>| v.clone().unwrap_or_default();
        let mut form = FormData::new();
        form.text("name", input.name.as_str())
            .text("email", input.email.as_str())
            .text("phone_num", or_empty(&input.phone_num))
            .text("emergency_phone_num", or_empty(&input.emergency_phone_num))
            .text("address", or_empty(&input.address))
            .text("team_id", or_empty(&input.team_id))
            .text("role_id", or_empty(&input.role_id))
            .text("pm_id", or_empty(&input.pm_id))
            .text("_method", "PUT");

        match &input.profile_pic {
            ImageChange::Replace(pic) => {
                form.file("profile_pic", pic.clone());
            }
            ImageChange::Clear => {
                form.text("profile_pic", "");
            }
            ImageChange::Keep => {}
        }

        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: format!("{}/api/users/{id}", self.base_url),
            headers: bearer(token),
            body: Body::Multipart(form),
        })
    }

    pub fn build_delete_employee(&self, token: &str, id: u64) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Delete,
            url: format!("{}/api/users/{id}", self.base_url),
            headers: bearer(token),
            body: Body::Empty,
        }
    }

    pub fn parse_list_employees(&self, response: HttpResponse) -> Result<Vec<EmployeeRecord>, ApiError> {
        check_status(&response, LIST_FALLBACK, false)?;
        parse_data(&response.body).map(Option::unwrap_or_default)
    }

    pub fn parse_list_team_leads(&self, response: HttpResponse) -> Result<Vec<TeamLeadRecord>, ApiError> {
        check_status(&response, TEAM_LEADS_FALLBACK, false)?;
        parse_data(&response.body).map(Option::unwrap_or_default)
    }

    /// Creation only reports acceptance; the new record arrives through the
    /// follow-up list refresh.
    pub fn parse_create_employee(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, MUTATION_FALLBACK, true)
    }

    pub fn parse_update_employee(&self, response: HttpResponse) -> Result<EmployeeRecord, ApiError> {
        check_status(&response, MUTATION_FALLBACK, true)?;
        parse_data(&response.body)?
            .ok_or_else(|| ApiError::Deserialization("response has no `data` record".to_string()))
    }

    pub fn parse_delete_employee(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, DELETE_FALLBACK, false)
    }
}

/// True when `role_id` converts to one of the privileged role numbers, using
/// the loose text-to-number rules browsers apply to form values.
pub fn is_privileged_role(role_id: Option<&str>) -> bool {
    let Some(text) = role_id else {
        return false;
    };
    loose_number(text).is_some_and(|n| PRIVILEGED_ROLES.contains(&n))
}

/// Blank is 0. `0x`, `0o` and `0b` prefixes take unsigned digits only.
fn loose_number(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return Some(0.0);
    }
    let radix = match text.get(..2) {
        Some("0x" | "0X") => 16,
        Some("0o" | "0O") => 8,
        Some("0b" | "0B") => 2,
        _ => return text.parse::<f64>().ok(),
    };
    let digits = &text[2..];
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    u64::from_str_radix(digits, radix).ok().map(|n| n as f64)
}

fn bearer(token: &str) -> Vec<(String, String)> {
    vec![("authorization".to_string(), format!("Bearer {token}"))]
}

fn json_headers(token: &str) -> Vec<(String, String)> {
    let mut headers = bearer(token);
    headers.push(("content-type".to_string(), "application/json".to_string()));
    headers
}

/// Map non-2xx responses to `ApiError::Rejected` with a resolved message.
///
/// Mutations prefer the first field error over the top-level message.
fn check_status(response: &HttpResponse, fallback: &str, field_errors_first: bool) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    let body = ServerError::from_body(&response.body);
    let selected = if field_errors_first {
        body.first_field_error().or_else(|| body.message())
    } else {
        body.message()
    };
    Err(ApiError::Rejected {
        status: response.status,
        message: selected.unwrap_or_else(|| fallback.to_string()),
    })
}

fn parse_data<T: serde::de::DeserializeOwned>(body: &str) -> Result<Option<T>, ApiError> {
    if body.trim().is_empty() {
        return Ok(None);
    }
    let envelope: Envelope<T> =
        serde_json::from_str(body).map_err(|e| ApiError::Deserialization(e.to_string()))?;
    Ok(envelope.data)
}
