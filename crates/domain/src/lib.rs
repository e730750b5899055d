//! # verdant-domain
//!
//! Pure domain model for the verdant grow controller.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Devices** and their capability role (power, sensor, exporter)
//! - Define **Schedules** (cron patterns) and their device associations
//! - Define **Metrics** and the immutable **metric logs** sensors produce
//! - Define **Triggers** (bound → power action rules) and the bound check
//! - Define **Exports** (export filters, outcomes, export records)
//! - Define **Grows** and **Recipes** (time-varying metric bounds)
//! - Contain all invariant enforcement and domain logic
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod device;
pub mod export;
pub mod grow;
pub mod metric;
pub mod recipe;
pub mod schedule;
pub mod trigger;
