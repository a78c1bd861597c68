use axum::body::Body;
use axum::http::{self, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mock_server::{app, router, AppState, Employee, DEFAULT_TOKEN, TEAM_LEAD_ROLE};
use serde_json::Value;
use tower::ServiceExt;

const BOUNDARY: &str = "employee-test-boundary";

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn multipart(fields: &[(&str, &str)], file: Option<(&str, &str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n").as_bytes(),
        );
    }
    if let Some((name, file_name, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: image/jpeg\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn form_request(uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(http::header::AUTHORIZATION, format!("Bearer {DEFAULT_TOKEN}"))
        .header(
            http::header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn authed(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::AUTHORIZATION, format!("Bearer {DEFAULT_TOKEN}"))
        .body(Body::empty())
        .unwrap()
}

async fn create(app: &Router, fields: &[(&str, &str)]) -> Employee {
    let resp = app
        .clone()
        .oneshot(form_request("/api/users", multipart(fields, None)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    serde_json::from_value(body_json(resp).await["data"].clone()).unwrap()
}

// --- auth ---

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let resp = app()
        .oneshot(Request::builder().uri("/api/users").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await["message"], "Unauthenticated.");
}

#[tokio::test]
async fn wrong_token_is_unauthorized() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/api/users")
                .header(http::header::AUTHORIZATION, "Bearer null")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// --- list ---

#[tokio::test]
async fn list_users_empty() {
    let resp = app().oneshot(authed("GET", "/api/users")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["data"], serde_json::json!([]));
}

// --- create ---

#[tokio::test]
async fn create_user_returns_201_with_record() {
    let app = app();
    let employee = create(
        &app,
        &[
            ("name", "Ada"),
            ("employee_id", "EMP-1"),
            ("email", "ada@example.com"),
            ("password", "secret"),
            ("role_id", "6"),
            ("team_id", "2"),
        ],
    )
    .await;

    assert_eq!(employee.id, 1);
    assert_eq!(employee.name, "Ada");
    assert_eq!(employee.role_id, Some(6));
    assert_eq!(employee.team_id, Some(2));

    let resp = app.oneshot(authed("GET", "/api/users")).await.unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert!(body["data"][0].get("password").is_none());
}

#[tokio::test]
async fn create_user_privileged_role_drops_team() {
    let employee = create(
        &app(),
        &[("name", "Boss"), ("email", "boss@example.com"), ("role_id", "2"), ("team_id", "9")],
    )
    .await;
    assert_eq!(employee.team_id, None);
}

#[tokio::test]
async fn create_user_accepts_raw_roles_and_team() {
    let employee = create(
        &app(),
        &[("name", "Raw"), ("email", "raw@example.com"), ("roles", "7"), ("team", "3")],
    )
    .await;
    assert_eq!(employee.role_id, Some(7));
    assert_eq!(employee.team_id, Some(3));
}

#[tokio::test]
async fn create_user_stores_uploaded_picture() {
    let resp = app()
        .oneshot(form_request(
            "/api/users",
            multipart(
                &[("name", "Pic"), ("email", "pic@example.com")],
                Some(("profile_pic", "me.jpg", &b"\xff\xd8\xff"[..])),
            ),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(body_json(resp).await["data"]["profile_pic"], "uploads/me.jpg");
}

#[tokio::test]
async fn create_user_missing_name_returns_422() {
    let resp = app()
        .oneshot(form_request("/api/users", multipart(&[("email", "a@b.c")], None)))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(resp).await;
    assert_eq!(body["errors"]["name"][0], "The name field is required.");
}

#[tokio::test]
async fn create_user_duplicate_email_returns_422() {
    let app = app();
    create(&app, &[("name", "Ada"), ("email", "ada@example.com")]).await;

    let resp = app
        .oneshot(form_request(
            "/api/users",
            multipart(&[("name", "Other"), ("email", "ada@example.com")], None),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(resp).await["errors"]["email"][0], "The email has already been taken.");
}

// --- update ---

#[tokio::test]
async fn update_user_requires_method_override() {
    let app = app();
    let employee = create(&app, &[("name", "Ada"), ("email", "ada@example.com")]).await;

    let resp = app
        .oneshot(form_request(
            &format!("/api/users/{}", employee.id),
            multipart(&[("name", "Ada"), ("email", "ada@example.com")], None),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_user_changes_fields_and_clears_picture() {
    let app = app();
    let resp = app
        .clone()
        .oneshot(form_request(
            "/api/users",
            multipart(
                &[("name", "Ada"), ("email", "ada@example.com")],
                Some(("profile_pic", "me.jpg", &b"img"[..])),
            ),
        ))
        .await
        .unwrap();
    let id = body_json(resp).await["data"]["id"].as_u64().unwrap();

    let resp = app
        .clone()
        .oneshot(form_request(
            &format!("/api/users/{id}"),
            multipart(
                &[
                    ("name", "Ada L."),
                    ("email", "ada@example.com"),
                    ("phone_num", "555"),
                    ("team_id", ""),
                    ("role_id", "5"),
                    ("pm_id", ""),
                    ("_method", "PUT"),
                    ("profile_pic", ""),
                ],
                None,
            ),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let data = body_json(resp).await["data"].clone();
    assert_eq!(data["name"], "Ada L.");
    assert_eq!(data["phone_num"], "555");
    assert_eq!(data["role_id"], 5);
    assert!(data["profile_pic"].is_null());
}

#[tokio::test]
async fn update_user_keeps_picture_when_field_omitted() {
    let app = app();
    let resp = app
        .clone()
        .oneshot(form_request(
            "/api/users",
            multipart(
                &[("name", "Ada"), ("email", "ada@example.com")],
                Some(("profile_pic", "me.jpg", &b"img"[..])),
            ),
        ))
        .await
        .unwrap();
    let id = body_json(resp).await["data"]["id"].as_u64().unwrap();

    let resp = app
        .oneshot(form_request(
            &format!("/api/users/{id}"),
            multipart(&[("name", "Ada"), ("email", "ada@example.com"), ("_method", "PUT")], None),
        ))
        .await
        .unwrap();
    assert_eq!(body_json(resp).await["data"]["profile_pic"], "uploads/me.jpg");
}

#[tokio::test]
async fn update_user_not_found() {
    let resp = app()
        .oneshot(form_request(
            "/api/users/42",
            multipart(&[("name", "X"), ("email", "x@example.com"), ("_method", "PUT")], None),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(resp).await["message"], "User not found.");
}

// --- delete ---

#[tokio::test]
async fn delete_user_then_not_found() {
    let app = app();
    let employee = create(&app, &[("name", "Ada"), ("email", "ada@example.com")]).await;
    let uri = format!("/api/users/{}", employee.id);

    let resp = app.clone().oneshot(authed("DELETE", &uri)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app.oneshot(authed("DELETE", &uri)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(resp).await["message"], "User not found.");
}

// --- team leads ---

#[tokio::test]
async fn team_leads_filters_by_team_and_role() {
    let state = AppState::new(DEFAULT_TOKEN);
    let app = router(state.clone());
    let lead_role = TEAM_LEAD_ROLE.to_string();
    create(&app, &[("name", "Lead A"), ("email", "a@example.com"), ("role_id", lead_role.as_str()), ("team_id", "3")]).await;
    create(&app, &[("name", "Lead B"), ("email", "b@example.com"), ("role_id", lead_role.as_str()), ("team_id", "4")]).await;
    create(&app, &[("name", "Dev"), ("email", "c@example.com"), ("role_id", "6"), ("team_id", "3")]).await;
    assert_eq!(state.db.read().await.employees.len(), 3);

    let resp = app.oneshot(authed("GET", "/api/getalltl?team_id=3")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["data"], serde_json::json!([{ "id": 1, "name": "Lead A" }]));
}

#[tokio::test]
async fn team_leads_without_team_id_returns_422() {
    let resp = app().oneshot(authed("GET", "/api/getalltl")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
