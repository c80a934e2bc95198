//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls and proximity ranking into use-case APIs.
//! - Keep HTTP/CLI layers decoupled from storage details.

pub mod directory_service;
