//! Taskdeck task manager library
//!
//! This module exports the core components for testing and integration.

pub mod api;
pub mod assistant;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod quick_add;
pub mod types;
pub mod validation;
