//! Application services: management use-cases around the control loop.
//!
//! Each service struct accepts port trait implementations via generic parameters
//! (constructor injection), keeping this layer decoupled from concrete adapters.

pub mod grow_service;
pub mod metric_service;
pub mod schedule_service;
pub mod trigger_service;
