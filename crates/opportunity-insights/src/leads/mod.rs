//! Lead capture: the contact records submitted to unlock a full insight report.
//!
//! Submissions are deduplicated on `(email, product)`, persisted as a whole
//! list on every append, and only readable with the admin token.

pub mod domain;
pub mod export;
pub mod file_store;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{LeadField, LeadId, LeadRecord, LeadSubmission};
pub use export::write_csv;
pub use file_store::JsonFileStore;
pub use repository::{InMemoryLeadStore, LeadStore, StoreError};
pub use router::{lead_router, ADMIN_TOKEN_HEADER};
pub use service::{AdminToken, LeadError, LeadService};
