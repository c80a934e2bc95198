//! Domain model for catalogued distributeurs.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Own write-path validation rules shared by every persistence backend.
//!
//! # Invariants
//! - Every distributeur is identified by a stable `DistributeurId`.
//! - Coordinates stored for a distributeur are finite and inside WGS84 bounds.

pub mod distributeur;
