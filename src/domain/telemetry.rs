// Telemetry display models - cards, chart series and table columns derived from records
use super::record::{Record, RecordField};
use serde::Serialize;

/// Text shown in place of a value the device did not report
pub const MISSING_VALUE: &str = "N/A";

pub fn format_value(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(value) => format!("{:.*}", precision, value),
        None => MISSING_VALUE.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardData {
    pub field: RecordField,
    pub title: String,
    pub unit: String,
    pub value: Option<f64>,
    pub precision: usize,
    pub display: String,
}

impl CardData {
    pub fn new(field: RecordField, title: &str, unit: &str, value: Option<f64>, precision: usize) -> Self {
        let display = format_value(value, precision);
        Self {
            field,
            title: title.to_string(),
            unit: unit.to_string(),
            value,
            precision,
            display,
        }
    }
}

const CARDS: [(RecordField, &str, &str, usize); 6] = [
    (RecordField::Temperature, "Temperature", "°C", 1),
    (RecordField::Humidity, "Humidity", "%", 1),
    (RecordField::Power, "Power", "W", 2),
    (RecordField::Voltage, "Voltage", "V", 2),
    (RecordField::DustDensity, "Dust Density", "µg/m³", 2),
    (RecordField::LdrPercent, "Light", "%", 0),
];

/// Summary cards for the latest sample; every card is present even with no sample
pub fn summary_cards(latest: Option<&Record>) -> Vec<CardData> {
    CARDS
        .iter()
        .map(|&(field, title, unit, precision)| {
            let value = latest.and_then(|record| record.numeric(field));
            CardData::new(field, title, unit, value, precision)
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesPoint {
    pub created_at: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesData {
    pub field: RecordField,
    pub color: String,
    pub points: Vec<SeriesPoint>,
}

impl SeriesData {
    /// Points for one field, oldest first. The view is newest first, so this
    /// walks it backwards; samples without a value are left out.
    pub fn from_view(view: &[Record], field: RecordField, color: &str) -> Self {
        let points = view
            .iter()
            .rev()
            .filter_map(|record| {
                record.numeric(field).map(|value| SeriesPoint {
                    created_at: record.created_at.clone(),
                    value,
                })
            })
            .collect();
        Self {
            field,
            color: color.to_string(),
            points,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub id: String,
    pub title: String,
    pub series: Vec<SeriesData>,
}

const CHARTS: [(&str, &str, &[(RecordField, &str)]); 5] = [
    ("power", "Power (W) Over Time", &[(RecordField::Power, "#22c55e")]),
    (
        "climate",
        "Temp (°C) & Humidity (%)",
        &[(RecordField::Temperature, "#ef4444"), (RecordField::Humidity, "#3b82f6")],
    ),
    (
        "electrical",
        "Voltage (V) & Current (A)",
        &[(RecordField::Voltage, "#eab308"), (RecordField::Current, "#8b5cf6")],
    ),
    ("dust", "Dust Density (µg/m³)", &[(RecordField::DustDensity, "#6b7280")]),
    (
        "light",
        "LDR Light Levels",
        &[(RecordField::LdrRaw, "#f97316"), (RecordField::LdrPercent, "#f59e0b")],
    ),
];

pub fn charts(view: &[Record]) -> Vec<ChartData> {
    CHARTS
        .iter()
        .map(|&(id, title, series)| ChartData {
            id: id.to_string(),
            title: title.to_string(),
            series: series
                .iter()
                .map(|&(field, color)| SeriesData::from_view(view, field, color))
                .collect(),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TableColumn {
    pub field: RecordField,
    pub label: &'static str,
    pub precision: usize,
}

pub fn table_columns() -> Vec<TableColumn> {
    [
        (RecordField::CreatedAt, "Timestamp", 0),
        (RecordField::Power, "Power (W)", 2),
        (RecordField::Voltage, "Voltage (V)", 2),
        (RecordField::Current, "Current (A)", 3),
        (RecordField::Temperature, "Temp (°C)", 1),
        (RecordField::Humidity, "Humidity (%)", 1),
        (RecordField::DustDensity, "Dust (µg/m³)", 2),
    ]
    .into_iter()
    .map(|(field, label, precision)| TableColumn {
        field,
        label,
        precision,
    })
    .collect()
}
