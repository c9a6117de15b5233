//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep CLI/transport layers decoupled from storage details.

pub mod catalog_service;
pub mod ledger_service;
pub mod message_service;
pub mod pet_model_service;
pub mod profile_service;
