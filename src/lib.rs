// src/lib.rs

pub mod config;
pub mod models;
pub mod services;

/// Timestamp layout used by every date field the remote API sends or accepts.
pub const API_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
