//! Full store lifecycle against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives every store operation
//! over real HTTP through `ReqwestTransport`. Validates that the core's
//! request building, multipart encoding, and reconciliation work end-to-end
//! with an actual server.

use std::sync::Arc;

use employee_core::{
    EmployeeClient, EmployeeStore, EmployeeUpdate, FilePart, ImageChange, NewEmployee, ReqwestTransport, StaticToken,
};

async fn start_server() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { mock_server::run(listener).await });
    format!("http://{addr}")
}

fn store(base_url: &str, token: Arc<StaticToken>) -> EmployeeStore {
    EmployeeStore::new(EmployeeClient::new(base_url), Arc::new(ReqwestTransport::new()), token)
}

fn new_employee(name: &str, email: &str) -> NewEmployee {
    NewEmployee {
        name: name.to_string(),
        employee_id: format!("EMP-{name}"),
        email: email.to_string(),
        password: "secret".to_string(),
        address: "1 Loop Rd".to_string(),
        phone_num: "555-0100".to_string(),
        emergency_phone_num: "555-0199".to_string(),
        ..Default::default()
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn store_lifecycle() {
    let base_url = start_server().await;
    let store = store(&base_url, Arc::new(StaticToken::new(mock_server::DEFAULT_TOKEN)));

    // Step 1: list - should be empty and loading cleared.
    assert!(store.list().await.accepted);
    assert!(store.employees().await.is_empty());
    assert!(!store.is_loading().await);

    // Step 2: create a team lead; the follow-up refresh picks it up.
    let lead = NewEmployee {
        role_id: Some("5".to_string()),
        team_id: Some("3".to_string()),
        ..new_employee("Lead", "lead@example.com")
    };
    let outcome = store.create(&lead).await;
    assert!(outcome.accepted, "{outcome:?}");
    let employees = store.employees().await;
    assert_eq!(employees.len(), 1);
    let lead_id = employees[0].id;

    // Step 3: create a privileged employee with a team; the team is dropped.
    let boss = NewEmployee {
        role_id: Some("2".to_string()),
        team_id: Some("3".to_string()),
        profile_pic: Some(FilePart::new("boss.jpg", "image/jpeg", vec![0xff, 0xd8, 0xff])),
        ..new_employee("Boss", "boss@example.com")
    };
    assert!(store.create(&boss).await.accepted);
    let employees = store.employees().await;
    assert_eq!(employees.len(), 2);
    let boss_record = employees.iter().find(|e| e.name.as_deref() == Some("Boss")).unwrap();
    assert!(boss_record.team_id.is_none());
    assert_eq!(boss_record.profile_pic.as_deref(), Some("uploads/boss.jpg"));
    let boss_id = boss_record.id;

    // Step 4: duplicate email is rejected with the server's field error.
    let outcome = store.create(&new_employee("Dup", "lead@example.com")).await;
    assert!(!outcome.accepted);
    assert_eq!(outcome.notices[0].title, "Failed to Add");
    assert_eq!(outcome.notices[0].message, "The email has already been taken.");
    assert_eq!(store.employees().await.len(), 2);

    // Step 5: team leads for team 3.
    assert!(store.list_team_leads("3").await.accepted);
    let leads = store.team_leads().await;
    assert_eq!(leads.len(), 1);
    assert_eq!(leads[0].id, lead_id);

    // Step 6: update the boss and clear the picture.
    let update = EmployeeUpdate {
        name: "Boss Renamed".to_string(),
        email: "boss@example.com".to_string(),
        role_id: Some("2".to_string()),
        profile_pic: ImageChange::Clear,
        ..Default::default()
    };
    assert!(store.update(boss_id, &update).await.accepted);
    let employees = store.employees().await;
    let boss_record = employees.iter().find(|e| e.id == boss_id).unwrap();
    assert_eq!(boss_record.name.as_deref(), Some("Boss Renamed"));
    assert!(boss_record.profile_pic.is_none());
    assert!(employees.iter().any(|e| e.id == lead_id && e.name.as_deref() == Some("Lead")));

    // Step 7: update an unknown id is rejected and changes nothing.
    let outcome = store.update(999, &update).await;
    assert!(!outcome.accepted);
    assert_eq!(outcome.notices[0].message, "User not found.");

    // Step 8: delete.
    assert!(store.remove(lead_id).await.accepted);
    assert_eq!(store.employees().await.len(), 1);

    // Step 9: delete again - server says not found, local state untouched.
    let outcome = store.remove(lead_id).await;
    assert!(!outcome.accepted);
    assert_eq!(store.last_error().await.as_deref(), Some("User not found."));
    assert_eq!(store.employees().await.len(), 1);

    // Step 10: list agrees with local state.
    store.list().await;
    let ids: Vec<u64> = store.employees().await.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![boss_id]);
    assert!(store.last_error().await.is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn wrong_token_surfaces_server_message() {
    let base_url = start_server().await;
    let store = store(&base_url, Arc::new(StaticToken::new("stale")));

    let outcome = store.list().await;
    assert!(!outcome.accepted);
    assert_eq!(store.last_error().await.as_deref(), Some("Unauthenticated."));

    let outcome = store.list_team_leads("3").await;
    assert!(!outcome.accepted);
    assert!(outcome.notices.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn unreachable_server_is_reported() {
    // Bind then drop to get a port with nothing listening.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let store = store(&format!("http://{addr}"), Arc::new(StaticToken::new("tok")));
    let outcome = store.remove(1).await;
    assert!(!outcome.accepted);
    assert!(store.last_error().await.is_some());
}
