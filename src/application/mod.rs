// Application layer - the sync state machine and the collaborators it drives
pub mod dashboard_service;
pub mod error;
pub mod history_service;
pub mod live_channel;
pub mod location_provider;
pub mod sync_engine;
