// Sync engine - the single authoritative view of records shown on the dashboard
use crate::application::error::SyncError;
use crate::domain::dashboard::EngineState;
use crate::domain::query::{DateRange, RequestDescriptor, SortConfig, build_query};
use crate::domain::record::{Record, RecordField};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// What to do with a live sample that falls outside the active date range
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LiveFilterPolicy {
    /// Always show live samples
    #[default]
    Bypass,
    /// Drop live samples dated outside the active range
    RespectDateRange,
}

/// A reload the caller must perform against the history service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingReload {
    pub seq: u64,
    pub descriptor: RequestDescriptor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    Applied { records: usize },
    Failed,
    /// A newer reload was issued after this one; the result was dropped
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiveOutcome {
    Prepended,
    Duplicate,
    OutOfRange,
}

/// State machine behind the dashboard: `idle -> loading -> idle | error`.
///
/// The engine never performs I/O. Every reload trigger hands back a
/// [`PendingReload`] tagged with a sequence number; the result is fed back
/// through [`SyncEngine::complete_reload`], which applies it only if no newer
/// reload has been issued since.
#[derive(Debug)]
pub struct SyncEngine {
    records: Vec<Record>,
    filter: DateRange,
    sort: SortConfig,
    state: EngineState,
    live_policy: LiveFilterPolicy,
    issued: u64,
    in_flight: Option<RequestDescriptor>,
    // Live samples that arrived while `in_flight` was outstanding, newest first
    live_since_issue: Vec<Record>,
}

impl SyncEngine {
    pub fn new(filter: DateRange, sort: SortConfig, live_policy: LiveFilterPolicy) -> Self {
        Self {
            records: Vec::new(),
            filter,
            sort,
            state: EngineState::Idle,
            live_policy,
            issued: 0,
            in_flight: None,
            live_since_issue: Vec::new(),
        }
    }

    pub fn current_view(&self) -> &[Record] {
        &self.records
    }

    pub fn latest(&self) -> Option<&Record> {
        self.records.first()
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn sort(&self) -> SortConfig {
        self.sort
    }

    pub fn filter(&self) -> &DateRange {
        &self.filter
    }

    pub fn live_policy(&self) -> LiveFilterPolicy {
        self.live_policy
    }

    /// Replace filter and sort and reload.
    ///
    /// Returns `None` when the request already in flight asks for exactly the
    /// same thing, since its result will do.
    pub fn configure(&mut self, filter: DateRange, sort: SortConfig) -> Option<PendingReload> {
        self.filter = filter;
        self.sort = sort;
        let descriptor = build_query(&self.filter, &self.sort);
        if self.in_flight.as_ref() == Some(&descriptor) {
            tracing::debug!("Identical request already in flight, not reissuing");
            return None;
        }
        Some(self.issue(descriptor))
    }

    /// Reload with the current configuration, superseding anything in flight
    pub fn reload(&mut self) -> PendingReload {
        let descriptor = build_query(&self.filter, &self.sort);
        self.issue(descriptor)
    }

    pub fn request_sort(&mut self, key: RecordField) -> PendingReload {
        self.sort = self.sort.toggle(key);
        self.reload()
    }

    fn issue(&mut self, descriptor: RequestDescriptor) -> PendingReload {
        self.issued += 1;
        self.state = EngineState::Loading;
        self.in_flight = Some(descriptor.clone());
        self.live_since_issue.clear();
        tracing::debug!(seq = self.issued, query = %descriptor.to_query_string(), "Issuing reload");
        PendingReload {
            seq: self.issued,
            descriptor,
        }
    }

    pub fn complete_reload(
        &mut self,
        seq: u64,
        result: Result<Vec<Record>, SyncError>,
    ) -> ReloadOutcome {
        if seq != self.issued || self.in_flight.is_none() {
            tracing::debug!(seq, latest = self.issued, "Discarding stale reload result");
            return ReloadOutcome::Stale;
        }
        self.in_flight = None;
        let live = std::mem::take(&mut self.live_since_issue);

        match result {
            Ok(batch) => {
                let mut seen = HashSet::new();
                let mut records: Vec<Record> = batch
                    .into_iter()
                    .filter(|record| seen.insert(record.id.clone()))
                    .collect();

                // Samples pushed while the request was out may postdate its window
                let carried: Vec<Record> = live
                    .into_iter()
                    .filter(|record| seen.insert(record.id.clone()))
                    .collect();
                if !carried.is_empty() {
                    tracing::debug!(count = carried.len(), "Re-applying live samples on top of reload");
                    records.splice(0..0, carried);
                }

                let count = records.len();
                self.records = records;
                self.state = EngineState::Idle;
                ReloadOutcome::Applied { records: count }
            }
            Err(error) => {
                tracing::warn!(seq, %error, "Reload failed, keeping previous records");
                self.state = EngineState::Error {
                    message: error.user_message(),
                };
                ReloadOutcome::Failed
            }
        }
    }

    /// Put a freshly pushed sample at the front of the view.
    ///
    /// Live samples are newer than anything in view by construction, so the
    /// active sort is not re-applied and no request is issued.
    pub fn on_live_update(&mut self, record: Record) -> LiveOutcome {
        if self.live_policy == LiveFilterPolicy::RespectDateRange && !self.filter.contains(&record) {
            return LiveOutcome::OutOfRange;
        }
        if self.records.iter().any(|existing| existing.id == record.id) {
            return LiveOutcome::Duplicate;
        }
        if self.in_flight.is_some() {
            self.live_since_issue.insert(0, record.clone());
        }
        self.records.insert(0, record);
        LiveOutcome::Prepended
    }
}

impl Default for SyncEngine {
    fn default() -> Self {
        Self::new(DateRange::default(), SortConfig::default(), LiveFilterPolicy::default())
    }
}
