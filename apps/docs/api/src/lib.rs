//! Documents HTTP API
//!
//! Serves the documents domain over axum:
//!
//! ```text
//! HTTP client
//!   ↓
//! /api/documents/*  (domain_documents::router)
//!   ↓
//! DocumentService
//!   ↓
//! ┌──────────────────────────┬─────────────────────────┐
//! │ InMemory | Qdrant store  │ Hashing | OpenAI embed  │
//! └──────────────────────────┴─────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `config`: environment-driven backend selection
//! - `openapi`: merged OpenAPI document
//! - `server`: service wiring and the HTTP lifecycle

pub mod config;
pub mod openapi;
pub mod server;

pub use config::Config;
pub use server::{build_app, build_service, run};
