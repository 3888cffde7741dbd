use crate::application::dashboard_service::SyncOptions;
use crate::application::sync_engine::LiveFilterPolicy;
use crate::domain::query::{DateRange, SortConfig, SortDirection};
use crate::domain::record::RecordField;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DashboardConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub history: HistorySettings,
    #[serde(default)]
    pub live: LiveSettings,
    #[serde(default)]
    pub location: LocationSettings,
    #[serde(default)]
    pub sync: SyncSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

/// Where stored telemetry is queried. Unset means every reload fails with a
/// configuration error.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct HistorySettings {
    pub base_url: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct LiveSettings {
    pub url: Option<String>,
    /// Seconds to wait for the event stream to answer
    pub connect_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LocationSettings {
    /// Operator switch for sharing the site location; off reports access as denied
    #[serde(default = "default_share")]
    pub share: bool,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Default for LocationSettings {
    fn default() -> Self {
        Self {
            share: default_share(),
            latitude: None,
            longitude: None,
        }
    }
}

fn default_share() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct SyncSettings {
    #[serde(default)]
    pub live_filter: LiveFilterPolicy,
    #[serde(default = "default_sort_by")]
    pub sort_by: RecordField,
    #[serde(default = "default_order")]
    pub order: SortDirection,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            live_filter: LiveFilterPolicy::default(),
            sort_by: default_sort_by(),
            order: default_order(),
            start_date: String::new(),
            end_date: String::new(),
        }
    }
}

fn default_sort_by() -> RecordField {
    SortConfig::default().key
}

fn default_order() -> SortDirection {
    SortConfig::default().direction
}

impl SyncSettings {
    pub fn to_options(&self) -> SyncOptions {
        SyncOptions {
            filter: DateRange::new(self.start_date.clone(), self.end_date.clone()),
            sort: SortConfig::new(self.sort_by, self.order),
            live_policy: self.live_filter,
        }
    }
}

/// Load `config/dashboard.{toml,yaml,json}` if present, overridden by
/// `SOLAR__SECTION__KEY` environment variables.
pub fn load_dashboard_config() -> anyhow::Result<DashboardConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/dashboard").required(false))
        .add_source(
            config::Environment::with_prefix("SOLAR")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}

pub fn parse_dashboard_config(toml: &str) -> anyhow::Result<DashboardConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::from_str(toml, config::FileFormat::Toml))
        .build()?;

    Ok(settings.try_deserialize()?)
}

impl DashboardConfig {
    pub fn log_config(&self) {
        tracing::info!("Configuration loaded:");
        tracing::info!("  server.bind      : {}", self.server.bind);
        tracing::info!(
            "  history.base_url : {}",
            self.history.base_url.as_deref().unwrap_or("<unset>")
        );
        tracing::info!("  live.url         : {}", self.live.url.as_deref().unwrap_or("<unset>"));
        tracing::info!(
            "  location         : {}",
            match (self.location.share, self.location.latitude, self.location.longitude) {
                (false, _, _) => "<not shared>".to_string(),
                (true, Some(lat), Some(lon)) => format!("{lat}, {lon}"),
                _ => "<unset>".to_string(),
            }
        );
        tracing::info!("  sync.live_filter : {:?}", self.sync.live_filter);
    }
}
