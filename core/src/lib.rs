//! Client core for the employee API.
//!
//! # Overview
//! `EmployeeClient` builds `HttpRequest` values and parses `HttpResponse`
//! values without touching the network. `EmployeeStore` sits on top: it runs
//! those round-trips through a `Transport`, keeps a local copy of the
//! employee list in sync with each mutation, and reports what happened as an
//! `Outcome` instead of raising UI notifications itself.
//!
//! # Design
//! - `EmployeeClient` is stateless. It holds only `base_url`.
//! - Each operation is split into `build_*` (produces request) and `parse_*`
//!   (consumes response), so the I/O boundary is explicit.
//! - Collaborators (`Transport`, `TokenProvider`, `ImageCompressor`) are
//!   traits injected into the store, so hosts and tests supply their own.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod auth;
pub mod client;
pub mod compress;
pub mod error;
pub mod http;
pub mod store;
pub mod transport;
pub mod types;

pub use auth::{StaticToken, TokenProvider};
pub use client::EmployeeClient;
pub use compress::{CompressionOptions, ImageCompressor, Passthrough};
pub use error::ApiError;
pub use http::{Body, FilePart, FormData, FormValue, HttpMethod, HttpRequest, HttpResponse};
pub use store::{EmployeeStore, Notice, Outcome, Severity, StoreState};
pub use transport::{ReqwestTransport, Transport};
pub use types::{EmployeeRecord, EmployeeUpdate, IdRef, ImageChange, NewEmployee, TeamLeadRecord};
