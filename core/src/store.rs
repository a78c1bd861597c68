//! Client-side cache of employees kept in sync with the backend.
//!
//! # Design
//! `EmployeeStore` owns a `StoreState` and drives `EmployeeClient` round-trips
//! through an injected `Transport`. Operations take `&self` and never hold
//! the state lock across a network await, so any number of them may be in
//! flight at once. There is no request ordering: whichever response lands
//! last wins, and merges are keyed by id so interleaved writes cannot corrupt
//! the collection.
//!
//! Nothing is surfaced through side effects. Every operation returns an
//! `Outcome` whose `notices` the host turns into toasts, log lines, or
//! whatever its UI uses.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::auth::TokenProvider;
use crate::client::EmployeeClient;
use crate::compress::{CompressionOptions, ImageCompressor, Passthrough};
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::Transport;
use crate::types::{EmployeeRecord, EmployeeUpdate, ImageChange, NewEmployee, TeamLeadRecord};

pub const LIST_NO_TOKEN: &str = "Unauthorized: No token found.";
pub const NO_TOKEN: &str = "No auth token found.";

/// Everything the store knows.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreState {
    pub employees: Vec<EmployeeRecord>,
    pub team_leads: Vec<TeamLeadRecord>,
    /// True until the first `list()` completes.
    pub loading: bool,
    /// Most recent failure message. Cleared by the next successful list,
    /// update, or delete.
    pub last_error: Option<String>,
}

impl Default for StoreState {
    fn default() -> Self {
        Self {
            employees: Vec::new(),
            team_leads: Vec::new(),
            loading: true,
            last_error: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
}

/// A user-facing message produced by an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub severity: Severity,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn success(title: &str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Success,
            title: title.to_string(),
            message: message.into(),
        }
    }

    pub fn error(title: &str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            title: title.to_string(),
            message: message.into(),
        }
    }
}

/// Result of a store operation: whether the server accepted it, plus the
/// notices to show.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    pub accepted: bool,
    pub notices: Vec<Notice>,
}

impl Outcome {
    fn accepted(notices: Vec<Notice>) -> Self {
        Self { accepted: true, notices }
    }

    fn rejected(notices: Vec<Notice>) -> Self {
        Self { accepted: false, notices }
    }

    pub fn errors(&self) -> impl Iterator<Item = &Notice> {
        self.notices.iter().filter(|n| n.severity == Severity::Error)
    }
}

pub struct EmployeeStore {
    client: EmployeeClient,
    transport: Arc<dyn Transport>,
    tokens: Arc<dyn TokenProvider>,
    compressor: Arc<dyn ImageCompressor>,
    compression: CompressionOptions,
    state: RwLock<StoreState>,
}

impl EmployeeStore {
    pub fn new(client: EmployeeClient, transport: Arc<dyn Transport>, tokens: Arc<dyn TokenProvider>) -> Self {
        Self {
            client,
            transport,
            tokens,
            compressor: Arc::new(Passthrough),
            compression: CompressionOptions::default(),
            state: RwLock::new(StoreState::default()),
        }
    }

    pub fn with_compressor(mut self, compressor: Arc<dyn ImageCompressor>) -> Self {
        self.compressor = compressor;
        self
    }

    pub fn with_compression_options(mut self, options: CompressionOptions) -> Self {
        self.compression = options;
        self
    }

    pub async fn state(&self) -> StoreState {
        self.state.read().await.clone()
    }

    pub async fn employees(&self) -> Vec<EmployeeRecord> {
        self.state.read().await.employees.clone()
    }

    pub async fn team_leads(&self) -> Vec<TeamLeadRecord> {
        self.state.read().await.team_leads.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.loading
    }

    pub async fn last_error(&self) -> Option<String> {
        self.state.read().await.last_error.clone()
    }

    pub async fn clear_team_leads(&self) {
        self.state.write().await.team_leads.clear();
    }

    /// Replace the employee collection with the server's.
    ///
    /// Without a token no request is made; the error slot is set and no
    /// notice is raised. `loading` is cleared on every path.
    pub async fn list(&self) -> Outcome {
        debug!("fetching employees");
        let Some(token) = self.tokens.bearer_token() else {
            warn!("no bearer token; skipping employee fetch");
            let mut state = self.state.write().await;
            state.last_error = Some(LIST_NO_TOKEN.to_string());
            state.loading = false;
            return Outcome::rejected(Vec::new());
        };

        let request = self.client.build_list_employees(&token);
        let result = self.round_trip(request, EmployeeClient::parse_list_employees).await;

        let mut state = self.state.write().await;
        state.loading = false;
        match result {
            Ok(employees) => {
                debug!(count = employees.len(), "employees fetched");
                state.employees = employees;
                state.last_error = None;
                Outcome::accepted(Vec::new())
            }
            Err(err) => {
                error!(%err, "error fetching employees");
                state.last_error = Some(err.to_string());
                Outcome::rejected(vec![Notice::error("Error", err.to_string())])
            }
        }
    }

    /// Replace the team-lead list for `team_id`. Failures leave an empty
    /// list and raise nothing.
    pub async fn list_team_leads(&self, team_id: &str) -> Outcome {
        debug!(team_id, "fetching team leads");
        let result = match self.tokens.bearer_token() {
            Some(token) => {
                let request = self.client.build_list_team_leads(&token, team_id);
                self.round_trip(request, EmployeeClient::parse_list_team_leads).await
            }
            None => Err(ApiError::Unauthorized(NO_TOKEN.to_string())),
        };

        let (leads, accepted) = match result {
            Ok(leads) => (leads, true),
            Err(err) => {
                error!(%err, team_id, "error fetching team leads");
                (Vec::new(), false)
            }
        };
        self.state.write().await.team_leads = leads;
        Outcome {
            accepted,
            notices: Vec::new(),
        }
    }

    /// Submit a new employee, then refresh the list whatever happened.
    ///
    /// Notices from the refresh are appended to the create's own.
    pub async fn create(&self, input: &NewEmployee) -> Outcome {
        let mut outcome = self.submit_create(input).await;
        let refresh = self.list().await;
        outcome.notices.extend(refresh.notices);
        outcome
    }

    async fn submit_create(&self, input: &NewEmployee) -> Outcome {
        let Some(token) = self.tokens.bearer_token() else {
            warn!("no bearer token; employee not created");
            return Outcome::rejected(Vec::new());
        };
        let request = match self.client.build_create_employee(&token, input) {
            Ok(request) => request,
            Err(err) => {
                warn!(%err, "create payload rejected");
                return Outcome::rejected(vec![Notice::error("Failed to Add", err.to_string())]);
            }
        };

        let response = match self.transport.execute(request).await {
            Ok(response) => response,
            Err(err) => {
                error!(%err, "error adding employee");
                return Outcome::rejected(Vec::new());
            }
        };
        match self.client.parse_create_employee(response) {
            Ok(()) => {
                info!(email = %input.email, "employee added");
                Outcome::accepted(vec![Notice::success("Success", "Employee added successfully")])
            }
            Err(err) => {
                warn!(%err, "server rejected new employee");
                Outcome::rejected(vec![Notice::error("Failed to Add", err.to_string())])
            }
        }
    }

    /// Submit changes for `id` and merge the returned record.
    ///
    /// A server rejection only raises a notice. Every other failure, a
    /// missing token included, also lands in the error slot.
    pub async fn update(&self, id: u64, input: &EmployeeUpdate) -> Outcome {
        let result = self.submit_update(id, input).await;

        let mut state = self.state.write().await;
        match result {
            Ok(record) => {
                for slot in state.employees.iter_mut().filter(|e| e.id == id) {
                    *slot = record.clone();
                }
                state.last_error = None;
                info!(id, "employee updated");
                Outcome::accepted(vec![Notice::success("Success", "Employee updated successfully")])
            }
            Err(err @ (ApiError::Rejected { .. } | ApiError::Validation(_))) => {
                warn!(%err, id, "server rejected employee update");
                Outcome::rejected(vec![Notice::error("Failed to Update", err.to_string())])
            }
            Err(err) => {
                error!(%err, id, "error updating employee");
                state.last_error = Some(err.to_string());
                Outcome::rejected(vec![Notice::error("Error", err.to_string())])
            }
        }
    }

    async fn submit_update(&self, id: u64, input: &EmployeeUpdate) -> Result<EmployeeRecord, ApiError> {
        let token = self
            .tokens
            .bearer_token()
            .ok_or_else(|| ApiError::Unauthorized(NO_TOKEN.to_string()))?;
        input.validate()?;

        let mut payload = input.clone();
        if let ImageChange::Replace(original) = &input.profile_pic {
            let file = match self.compressor.compress(original, &self.compression).await {
                Ok(compressed) => {
                    debug!(before = original.len(), after = compressed.len(), "profile picture compressed");
                    compressed
                }
                Err(err) => {
                    error!(%err, "image compression failed; sending original");
                    original.clone()
                }
            };
            payload.profile_pic = ImageChange::Replace(file);
        }

        let request = self.client.build_update_employee(&token, id, &payload)?;
        debug!(id, body = ?request.body, "submitting employee update");
        self.round_trip(request, EmployeeClient::parse_update_employee).await
    }

    /// Delete `id` on the server, then drop it locally.
    pub async fn remove(&self, id: u64) -> Outcome {
        let result = match self.tokens.bearer_token() {
            Some(token) => {
                let request = self.client.build_delete_employee(&token, id);
                self.round_trip(request, EmployeeClient::parse_delete_employee).await
            }
            None => Err(ApiError::Unauthorized(NO_TOKEN.to_string())),
        };

        let mut state = self.state.write().await;
        match result {
            Ok(()) => {
                state.employees.retain(|e| e.id != id);
                state.last_error = None;
                info!(id, "employee deleted");
                Outcome::accepted(vec![Notice::success("Success", "Deleted Successfully")])
            }
            Err(err) => {
                error!(%err, id, "error deleting employee");
                state.last_error = Some(err.to_string());
                Outcome::rejected(vec![Notice::error("Error", err.to_string())])
            }
        }
    }

    async fn round_trip<T>(
        &self,
        request: HttpRequest,
        parse: fn(&EmployeeClient, HttpResponse) -> Result<T, ApiError>,
    ) -> Result<T, ApiError> {
        let response = self.transport.execute(request).await?;
        parse(&self.client, response)
    }
}
