// Location provider trait - one-shot position lookup for the tilt advisor
use crate::application::error::LocationError;
use crate::domain::tilt::LocationFix;
use async_trait::async_trait;

#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn locate(&self) -> Result<LocationFix, LocationError>;
}
