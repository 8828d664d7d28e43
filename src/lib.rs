//! Work Hours Tracker: time tracking for jobs grouped into packages.

pub mod config;
pub mod duration;
pub mod error;
pub mod forms;
pub mod model;
pub mod store;
pub mod web;
