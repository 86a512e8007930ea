//! registra - patient registration form toolkit
//!
//! Validates registration forms, maps them to and from backend patient
//! records, and keeps auto-saved drafts.

pub mod cli;
pub mod commands;
pub mod config;
