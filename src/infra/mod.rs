//! Infrastructure layer (adapters/implementations).
//!
//! This module contains the IO-heavy pieces: SQLite persistence and configuration files.

pub mod app_config;
pub mod db;
