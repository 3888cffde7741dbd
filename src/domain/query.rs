// Query model - sort/filter configuration and the history service request
use super::record::{Record, RecordField};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortConfig {
    pub key: RecordField,
    pub direction: SortDirection,
}

impl SortConfig {
    pub fn new(key: RecordField, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    /// Sort requested by clicking a column: same key flips, new key starts ascending
    pub fn toggle(self, key: RecordField) -> Self {
        if self.key == key {
            Self::new(key, self.direction.toggled())
        } else {
            Self::new(key, SortDirection::Asc)
        }
    }
}

impl Default for SortConfig {
    fn default() -> Self {
        Self::new(RecordField::CreatedAt, SortDirection::Desc)
    }
}

/// Calendar-date filter. An empty string leaves that side unbounded.
///
/// Dates are not validated here; the history service decides what they mean.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
}

impl DateRange {
    pub fn new(start_date: impl Into<String>, end_date: impl Into<String>) -> Self {
        Self {
            start_date: start_date.into(),
            end_date: end_date.into(),
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.start_date.is_empty() && self.end_date.is_empty()
    }

    /// Whether a record's date falls inside the range (inclusive).
    ///
    /// A bound that does not parse as `YYYY-MM-DD` is treated as unbounded, and a
    /// record without a readable date is accepted.
    pub fn contains(&self, record: &Record) -> bool {
        let Some(date) = record.created_date() else {
            return true;
        };
        let after_start = parse_bound(&self.start_date).is_none_or(|start| date >= start);
        let before_end = parse_bound(&self.end_date).is_none_or(|end| date <= end);
        after_start && before_end
    }
}

fn parse_bound(bound: &str) -> Option<NaiveDate> {
    if bound.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(bound, "%Y-%m-%d").ok()
}

/// Canonical parameter set for one history service request.
///
/// Parameters always appear in the order `startDate`, `endDate`, `sortBy`,
/// `order`, so equal inputs yield equal descriptors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RequestDescriptor {
    params: Vec<(&'static str, String)>,
}

impl RequestDescriptor {
    pub fn params(&self) -> &[(&'static str, String)] {
        &self.params
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn to_query_string(&self) -> String {
        self.params
            .iter()
            .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

pub fn build_query(filter: &DateRange, sort: &SortConfig) -> RequestDescriptor {
    let mut params = Vec::with_capacity(4);
    if !filter.start_date.is_empty() {
        params.push(("startDate", filter.start_date.clone()));
    }
    if !filter.end_date.is_empty() {
        params.push(("endDate", filter.end_date.clone()));
    }
    params.push(("sortBy", sort.key.as_str().to_string()));
    params.push(("order", sort.direction.as_str().to_string()));
    RequestDescriptor { params }
}
