use std::fmt;
use std::io::Write;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::domain::{LeadField, LeadId, LeadRecord, LeadSubmission};
use super::export::write_csv;
use super::repository::{LeadStore, StoreError};

/// Secret guarding read access to stored leads.
#[derive(Clone)]
pub struct AdminToken(String);

impl AdminToken {
    pub fn new<T: Into<String>>(token: T) -> Self {
        Self(token.into())
    }

    /// Compares every byte regardless of where the first mismatch occurs.
    pub fn matches(&self, candidate: &str) -> bool {
        let expected = self.0.as_bytes();
        let candidate = candidate.as_bytes();
        if expected.len() != candidate.len() {
            return false;
        }
        expected
            .iter()
            .zip(candidate)
            .fold(0u8, |diff, (a, b)| diff | (a ^ b))
            == 0
    }
}

impl fmt::Debug for AdminToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AdminToken(**redacted**)")
    }
}

/// Errors surfaced by the lead service.
#[derive(Debug, thiserror::Error)]
pub enum LeadError {
    #[error("missing required field: {0}")]
    Validation(LeadField),
    #[error("unauthorized")]
    Unauthorized,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to write lead export: {0}")]
    Export(#[from] csv::Error),
}

/// Issues strictly increasing millisecond ids.
#[derive(Debug, Default)]
struct IdClock {
    last: i64,
}

impl IdClock {
    fn issue(&mut self, now: DateTime<Utc>, floor: Option<i64>) -> LeadId {
        let candidate = now.timestamp_millis();
        let last = floor.map_or(self.last, |floor| floor.max(self.last));
        let next = if candidate > last { candidate } else { last + 1 };
        self.last = next;
        LeadId(next.to_string())
    }
}

/// Lead capture facade: validates submissions, suppresses duplicates, and
/// gates reads behind the admin token.
///
/// The internal lock spans the whole load-modify-save cycle, so concurrent
/// appends through one service never overwrite each other.
pub struct LeadService<S> {
    store: Arc<S>,
    admin_token: AdminToken,
    write_lock: Mutex<IdClock>,
}

impl<S> LeadService<S>
where
    S: LeadStore + 'static,
{
    pub fn new(store: Arc<S>, admin_token: AdminToken) -> Self {
        Self {
            store,
            admin_token,
            write_lock: Mutex::new(IdClock::default()),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Append a lead, or return the stored record when `(email, product)` was
    /// already captured.
    pub fn append(&self, submission: LeadSubmission) -> Result<LeadRecord, LeadError> {
        let lead = submission.validate().map_err(LeadError::Validation)?;

        let mut clock = self
            .write_lock
            .lock()
            .map_err(|_| StoreError::Unavailable("lead store lock poisoned".to_string()))?;

        let mut records = self.load_for_write()?;

        if let Some(existing) = records
            .iter()
            .find(|record| record.same_key(&lead.email, &lead.product))
        {
            debug!(lead_id = %existing.id, product = %lead.product, "duplicate lead suppressed");
            return Ok(existing.clone());
        }

        let now = Utc::now();
        let floor = records.iter().filter_map(|record| record.id.sequence()).max();
        let record = LeadRecord {
            id: clock.issue(now, floor),
            submitted_at: now,
            name: lead.name,
            email: lead.email,
            phone: lead.phone,
            product: lead.product,
            country_of_interest: lead.country,
        };

        records.push(record.clone());
        self.store.save(&records)?;

        info!(
            lead_id = %record.id,
            product = %record.product,
            total = records.len(),
            "lead captured"
        );
        Ok(record)
    }

    /// All stored leads, oldest first.
    pub fn list(&self, credential: &str) -> Result<Vec<LeadRecord>, LeadError> {
        self.authorize(credential)?;
        Ok(self.load_or_empty())
    }

    /// Write the admin CSV export (newest first) for an authorized caller.
    pub fn export_csv<W: Write>(&self, credential: &str, writer: W) -> Result<usize, LeadError> {
        let records = self.list(credential)?;
        write_csv(&records, writer)?;
        Ok(records.len())
    }

    fn authorize(&self, credential: &str) -> Result<(), LeadError> {
        if self.admin_token.matches(credential) {
            Ok(())
        } else {
            warn!("lead listing rejected: invalid admin token");
            Err(LeadError::Unauthorized)
        }
    }

    /// Only a corrupt list may be replaced; any other read failure must not
    /// lead to a save that drops the records already on disk.
    fn load_for_write(&self) -> Result<Vec<LeadRecord>, StoreError> {
        match self.store.load() {
            Ok(records) => Ok(records),
            Err(err @ StoreError::Corrupt { .. }) => {
                warn!(error = %err, "lead store is corrupt; starting a fresh list");
                Ok(Vec::new())
            }
            Err(err) => Err(err),
        }
    }

    fn load_or_empty(&self) -> Vec<LeadRecord> {
        match self.store.load() {
            Ok(records) => records,
            Err(err) => {
                warn!(error = %err, "lead store unreadable; treating as empty");
                Vec::new()
            }
        }
    }
}
