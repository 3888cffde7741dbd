// Record domain model - one telemetry sample from the panel monitor
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One sample reported by the monitoring device.
///
/// Every measurement is independently optional: the history service and the
/// live channel may omit any of them, and nothing here fills in or clamps
/// values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub humidity: Option<f64>,
    #[serde(default)]
    pub dust_density: Option<f64>,
    #[serde(default)]
    pub voltage: Option<f64>,
    #[serde(default)]
    pub current: Option<f64>,
    #[serde(default)]
    pub power: Option<f64>,
    #[serde(default)]
    pub ldr_raw: Option<f64>,
    #[serde(default)]
    pub ldr_percent: Option<f64>,
    #[serde(default)]
    pub tilt_angle: Option<f64>,
    #[serde(default)]
    pub created_at: String,
}

impl Record {
    pub fn new(id: impl Into<String>, created_at: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            temperature: None,
            humidity: None,
            dust_density: None,
            voltage: None,
            current: None,
            power: None,
            ldr_raw: None,
            ldr_percent: None,
            tilt_angle: None,
            created_at: created_at.into(),
        }
    }

    /// Value of a numeric field, `None` if unknown or if the field is not numeric
    pub fn numeric(&self, field: RecordField) -> Option<f64> {
        match field {
            RecordField::Id | RecordField::CreatedAt => None,
            RecordField::Temperature => self.temperature,
            RecordField::Humidity => self.humidity,
            RecordField::DustDensity => self.dust_density,
            RecordField::Voltage => self.voltage,
            RecordField::Current => self.current,
            RecordField::Power => self.power,
            RecordField::LdrRaw => self.ldr_raw,
            RecordField::LdrPercent => self.ldr_percent,
            RecordField::TiltAngle => self.tilt_angle,
        }
    }

    /// Calendar date of `createdAt`.
    ///
    /// Accepts full RFC 3339 timestamps and anything starting with a
    /// `YYYY-MM-DD` date; returns `None` otherwise.
    pub fn created_date(&self) -> Option<NaiveDate> {
        if let Ok(timestamp) = DateTime::parse_from_rfc3339(&self.created_at) {
            return Some(timestamp.date_naive());
        }
        self.created_at
            .get(..10)
            .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
    }
}

/// Every field of [`Record`], named as the history service names them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordField {
    #[serde(rename = "_id")]
    Id,
    #[serde(rename = "temperature")]
    Temperature,
    #[serde(rename = "humidity")]
    Humidity,
    #[serde(rename = "dustDensity")]
    DustDensity,
    #[serde(rename = "voltage")]
    Voltage,
    #[serde(rename = "current")]
    Current,
    #[serde(rename = "power")]
    Power,
    #[serde(rename = "ldrRaw")]
    LdrRaw,
    #[serde(rename = "ldrPercent")]
    LdrPercent,
    #[serde(rename = "tiltAngle")]
    TiltAngle,
    #[serde(rename = "createdAt")]
    CreatedAt,
}

impl RecordField {
    pub const ALL: [RecordField; 11] = [
        RecordField::Id,
        RecordField::Temperature,
        RecordField::Humidity,
        RecordField::DustDensity,
        RecordField::Voltage,
        RecordField::Current,
        RecordField::Power,
        RecordField::LdrRaw,
        RecordField::LdrPercent,
        RecordField::TiltAngle,
        RecordField::CreatedAt,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RecordField::Id => "_id",
            RecordField::Temperature => "temperature",
            RecordField::Humidity => "humidity",
            RecordField::DustDensity => "dustDensity",
            RecordField::Voltage => "voltage",
            RecordField::Current => "current",
            RecordField::Power => "power",
            RecordField::LdrRaw => "ldrRaw",
            RecordField::LdrPercent => "ldrPercent",
            RecordField::TiltAngle => "tiltAngle",
            RecordField::CreatedAt => "createdAt",
        }
    }

    pub fn is_numeric(self) -> bool {
        !matches!(self, RecordField::Id | RecordField::CreatedAt)
    }
}

impl fmt::Display for RecordField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown record field: {0}")]
pub struct UnknownField(pub String);

impl FromStr for RecordField {
    type Err = UnknownField;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        RecordField::ALL
            .into_iter()
            .find(|field| field.as_str() == name)
            .ok_or_else(|| UnknownField(name.to_string()))
    }
}
