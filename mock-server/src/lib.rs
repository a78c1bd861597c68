use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;

pub const DEFAULT_TOKEN: &str = "test-token";

/// Role ids that are never attached to a team.
pub const PRIVILEGED_ROLES: [i64; 4] = [1, 2, 3, 4];
pub const TEAM_LEAD_ROLE: i64 = 5;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: u64,
    pub name: String,
    pub employee_id: String,
    pub email: String,
    pub address: String,
    pub phone_num: String,
    pub emergency_phone_num: String,
    pub role_id: Option<i64>,
    pub team_id: Option<i64>,
    pub tl_id: Option<i64>,
    pub pm_id: Option<i64>,
    pub profile_pic: Option<String>,
}

#[derive(Debug, Default)]
pub struct Db {
    pub employees: BTreeMap<u64, Employee>,
    next_id: u64,
}

impl Db {
    pub fn insert(&mut self, mut employee: Employee) -> Employee {
        self.next_id += 1;
        employee.id = self.next_id;
        self.employees.insert(employee.id, employee.clone());
        employee
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<RwLock<Db>>,
    token: Arc<str>,
}

pub fn app() -> Router {
    app_with_token(DEFAULT_TOKEN)
}

impl AppState {
    pub fn new(token: &str) -> Self {
        Self {
            db: Arc::default(),
            token: Arc::from(token),
        }
    }
}

pub fn app_with_token(token: &str) -> Router {
    router(AppState::new(token))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/users", get(list_users).post(create_user))
        .route("/api/users/{id}", post(update_user).delete(delete_user))
        .route("/api/getalltl", get(list_team_leads))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with_token(listener: TcpListener, token: &str) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_token(token)).await
}

/// Error response in the backend's shape.
#[derive(Debug)]
pub struct ApiFailure {
    status: StatusCode,
    body: Value,
}

impl ApiFailure {
    fn message(status: StatusCode, message: &str) -> Self {
        Self {
            status,
            body: json!({ "message": message }),
        }
    }

    fn field(field: &str, message: String) -> Self {
        let mut errors = serde_json::Map::new();
        errors.insert(field.to_string(), json!([message]));
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            body: json!({ "message": message, "errors": errors }),
        }
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiFailure> {
    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    match presented {
        Some(token) if token == &*state.token => Ok(()),
        _ => Err(ApiFailure::message(StatusCode::UNAUTHORIZED, "Unauthenticated.")),
    }
}

#[derive(Debug)]
enum FormField {
    Text(String),
    File { file_name: String },
}

/// Collect multipart fields by name; the first occurrence wins.
async fn read_form(mut multipart: Multipart) -> Result<HashMap<String, FormField>, ApiFailure> {
    let mut fields = HashMap::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiFailure::message(StatusCode::BAD_REQUEST, &e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let value = match field.file_name().map(str::to_string) {
            Some(file_name) => {
                field
                    .bytes()
                    .await
                    .map_err(|e| ApiFailure::message(StatusCode::BAD_REQUEST, &e.to_string()))?;
                FormField::File { file_name }
            }
            None => FormField::Text(
                field
                    .text()
                    .await
                    .map_err(|e| ApiFailure::message(StatusCode::BAD_REQUEST, &e.to_string()))?,
            ),
        };
        fields.entry(name).or_insert(value);
    }
    Ok(fields)
}

fn text<'a>(form: &'a HashMap<String, FormField>, name: &str) -> Option<&'a str> {
    match form.get(name)? {
        FormField::Text(s) => Some(s),
        FormField::File { .. } => None,
    }
}

fn required(form: &HashMap<String, FormField>, name: &str) -> Result<String, ApiFailure> {
    match text(form, name).map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ApiFailure::field(name, format!("The {} field is required.", name.replace('_', " ")))),
    }
}

/// Empty or missing → `None`; anything else must be an integer.
fn optional_id(form: &HashMap<String, FormField>, name: &str) -> Result<Option<i64>, ApiFailure> {
    match text(form, name).map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => v
            .parse()
            .map(Some)
            .map_err(|_| ApiFailure::field(name, format!("The {} must be an integer.", name.replace('_', " ")))),
    }
}

fn ensure_unique(db: &Db, skip: Option<u64>, email: &str, employee_id: &str) -> Result<(), ApiFailure> {
    for other in db.employees.values().filter(|e| Some(e.id) != skip) {
        if other.email.eq_ignore_ascii_case(email) {
            return Err(ApiFailure::field("email", "The email has already been taken.".to_string()));
        }
        if !employee_id.is_empty() && other.employee_id == employee_id {
            return Err(ApiFailure::field(
                "employee_id",
                "The employee id has already been taken.".to_string(),
            ));
        }
    }
    Ok(())
}

fn stored_pic(form: &HashMap<String, FormField>) -> Option<Option<String>> {
    match form.get("profile_pic")? {
        FormField::File { file_name } => Some(Some(format!("uploads/{file_name}"))),
        FormField::Text(s) if s.is_empty() => Some(None),
        FormField::Text(s) => Some(Some(s.clone())),
    }
}

async fn list_users(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<Value>, ApiFailure> {
    authorize(&state, &headers)?;
    let db = state.db.read().await;
    let employees: Vec<&Employee> = db.employees.values().collect();
    Ok(Json(json!({ "data": employees })))
}

#[derive(Deserialize)]
struct TeamQuery {
    team_id: Option<String>,
}

async fn list_team_leads(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<TeamQuery>,
) -> Result<Json<Value>, ApiFailure> {
    authorize(&state, &headers)?;
    let team_id: i64 = query
        .team_id
        .as_deref()
        .and_then(|t| t.trim().parse().ok())
        .ok_or_else(|| ApiFailure::field("team_id", "The team id field is required.".to_string()))?;

    let db = state.db.read().await;
    let leads: Vec<Value> = db
        .employees
        .values()
        .filter(|e| e.role_id == Some(TEAM_LEAD_ROLE) && e.team_id == Some(team_id))
        .map(|e| json!({ "id": e.id, "name": e.name }))
        .collect();
    Ok(Json(json!({ "data": leads })))
}

async fn create_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Value>), ApiFailure> {
    authorize(&state, &headers)?;
    let form = read_form(multipart).await?;

    let name = required(&form, "name")?;
    let email = required(&form, "email")?;
    let employee_id = text(&form, "employee_id").unwrap_or_default().trim().to_string();
    let role_id = match optional_id(&form, "role_id")? {
        Some(role) => Some(role),
        None => optional_id(&form, "roles")?,
    };
    let team_id = if role_id.is_some_and(|r| PRIVILEGED_ROLES.contains(&r)) {
        None
    } else {
        match optional_id(&form, "team_id")? {
            Some(team) => Some(team),
            None => optional_id(&form, "team")?,
        }
    };

    let mut db = state.db.write().await;
    ensure_unique(&db, None, &email, &employee_id)?;
    let employee = db.insert(Employee {
        id: 0,
        name,
        employee_id,
        email,
        address: text(&form, "address").unwrap_or_default().to_string(),
        phone_num: text(&form, "phone_num").unwrap_or_default().to_string(),
        emergency_phone_num: text(&form, "emergency_phone_num").unwrap_or_default().to_string(),
        role_id,
        team_id,
        tl_id: optional_id(&form, "tl_id")?,
        pm_id: None,
        profile_pic: stored_pic(&form).flatten(),
    });
    info!(id = employee.id, "user created");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "User created successfully", "data": employee })),
    ))
}

async fn update_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiFailure> {
    authorize(&state, &headers)?;
    let form = read_form(multipart).await?;
    if text(&form, "_method") != Some("PUT") {
        return Err(ApiFailure::message(
            StatusCode::BAD_REQUEST,
            "Updates must be sent with _method=PUT.",
        ));
    }

    let name = required(&form, "name")?;
    let email = required(&form, "email")?;
    let role_id = optional_id(&form, "role_id")?;
    let team_id = optional_id(&form, "team_id")?;
    let pm_id = optional_id(&form, "pm_id")?;

    let mut db = state.db.write().await;
    if !db.employees.contains_key(&id) {
        return Err(ApiFailure::message(StatusCode::NOT_FOUND, "User not found."));
    }
    let employee_id = db.employees[&id].employee_id.clone();
    ensure_unique(&db, Some(id), &email, &employee_id)?;

    let Some(employee) = db.employees.get_mut(&id) else {
        return Err(ApiFailure::message(StatusCode::NOT_FOUND, "User not found."));
    };
    employee.name = name;
    employee.email = email;
    employee.phone_num = text(&form, "phone_num").unwrap_or_default().to_string();
    employee.emergency_phone_num = text(&form, "emergency_phone_num").unwrap_or_default().to_string();
    employee.address = text(&form, "address").unwrap_or_default().to_string();
    employee.role_id = role_id;
    employee.team_id = if role_id.is_some_and(|r| PRIVILEGED_ROLES.contains(&r)) {
        None
    } else {
        team_id
    };
    employee.pm_id = pm_id;
    if let Some(pic) = stored_pic(&form) {
        employee.profile_pic = pic;
    }
    info!(id, "user updated");
    Ok(Json(json!({ "message": "User updated successfully", "data": employee })))
}

async fn delete_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<Value>, ApiFailure> {
    authorize(&state, &headers)?;
    let mut db = state.db.write().await;
    db.employees
        .remove(&id)
        .map(|_| Json(json!({ "message": "User deleted successfully" })))
        .ok_or_else(|| ApiFailure::message(StatusCode::NOT_FOUND, "User not found."))
}
