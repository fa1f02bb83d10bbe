//! Observability endpoints.

mod health;

pub use health::{health_router, HealthState};
