// Solar panel telemetry dashboard - client-side sync of history, live updates and tilt advice
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
