// Dashboard domain model - the resolved state handed to the presentation layer
use super::query::{DateRange, SortConfig};
use super::record::Record;
use super::telemetry::{CardData, ChartData, TableColumn};
use super::tilt::Recommendation;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum EngineState {
    Idle,
    Loading,
    Error { message: String },
}

impl EngineState {
    pub fn is_loading(&self) -> bool {
        matches!(self, EngineState::Loading)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            EngineState::Error { message } => Some(message),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub state: EngineState,
    pub loading_since: Option<DateTime<Utc>>,
    pub live_connected: bool,
    pub sort: SortConfig,
    pub filter: DateRange,
    pub records: Vec<Record>,
    pub latest: Option<Record>,
    pub cards: Vec<CardData>,
    pub charts: Vec<ChartData>,
    pub columns: Vec<TableColumn>,
    pub recommendation: Recommendation,
}

impl DashboardSnapshot {
    /// Snapshot used before the dashboard task publishes anything
    pub fn initial() -> Self {
        Self {
            state: EngineState::Idle,
            loading_since: None,
            live_connected: false,
            sort: SortConfig::default(),
            filter: DateRange::default(),
            records: Vec::new(),
            latest: None,
            cards: super::telemetry::summary_cards(None),
            charts: super::telemetry::charts(&[]),
            columns: super::telemetry::table_columns(),
            recommendation: super::tilt::evaluate(None, None, None),
        }
    }
}
