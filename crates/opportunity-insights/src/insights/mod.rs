//! Opportunity catalog loading and deterministic insight scoring.

pub mod catalog;
pub mod scoring;

pub use catalog::{CatalogError, OpportunityCatalog, OpportunityRow};
pub use scoring::{generate, OpportunityMetrics};
