//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate parsing, command execution and history into use-case APIs.
//! - Keep CLI/GUI layers decoupled from store and storage details.

pub mod book_service;
