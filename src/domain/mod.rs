// Domain layer - telemetry records and the pure logic derived from them
pub mod dashboard;
pub mod query;
pub mod record;
pub mod telemetry;
pub mod tilt;
