// Location provider backed by configured coordinates
use crate::application::error::LocationError;
use crate::application::location_provider::LocationProvider;
use crate::domain::tilt::LocationFix;
use crate::infrastructure::config::LocationSettings;
use async_trait::async_trait;

/// Headless deployments have no positioning hardware; the panel's site is
/// configured instead. Without coordinates the provider reports itself as
/// unavailable, and with sharing switched off as denied.
#[derive(Debug, Clone)]
pub struct StaticLocationProvider {
    result: Result<LocationFix, LocationError>,
}

impl StaticLocationProvider {
    pub fn new(fix: Option<LocationFix>) -> Self {
        Self {
            result: fix.ok_or(LocationError::Unavailable),
        }
    }

    pub fn denied() -> Self {
        Self {
            result: Err(LocationError::PermissionDenied),
        }
    }

    pub fn from_settings(settings: &LocationSettings) -> Self {
        if !settings.share {
            return Self::denied();
        }
        let fix = match (settings.latitude, settings.longitude) {
            (Some(latitude), Some(longitude)) => Some(LocationFix::new(latitude, longitude)),
            _ => None,
        };
        Self::new(fix)
    }
}

#[async_trait]
impl LocationProvider for StaticLocationProvider {
    async fn locate(&self) -> Result<LocationFix, LocationError> {
        self.result.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_configured_fix() {
        let settings = LocationSettings {
            share: true,
            latitude: Some(-33.8),
            longitude: Some(151.2),
        };
        let provider = StaticLocationProvider::from_settings(&settings);

        assert_eq!(provider.locate().await, Ok(LocationFix::new(-33.8, 151.2)));
    }

    #[tokio::test]
    async fn test_partial_coordinates_are_unavailable() {
        let settings = LocationSettings {
            share: true,
            latitude: Some(52.0),
            longitude: None,
        };
        let provider = StaticLocationProvider::from_settings(&settings);

        assert_eq!(provider.locate().await, Err(LocationError::Unavailable));
    }

    #[tokio::test]
    async fn test_unshared_location_is_denied() {
        let settings = LocationSettings {
            share: false,
            latitude: Some(52.0),
            longitude: Some(13.4),
        };
        let provider = StaticLocationProvider::from_settings(&settings);

        assert_eq!(provider.locate().await, Err(LocationError::PermissionDenied));
    }
}
