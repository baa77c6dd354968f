//! # ask-responder
//!
//! Webhook service behind a chat `/ask` slash command. It looks the question
//! up in a document-search backend and replies with the best match, or asks
//! the user to be more specific, always inside the platform's ~3 s response
//! window.
//!
//! ## Request flow
//!
//! ```text
//!     POST /slack/ask ──────────────┐      POST /slack/ask/deferred
//!                                   │        │ ack now, spawn ─┐
//!                                   ▼                          ▼
//!                           ┌───────────────┐
//!                           │   Responder   │  one deadline clock per request
//!                           └───────┬───────┘
//!              ┌────────────────────┼─────────────────────┐
//!              ▼                    ▼                     ▼
//!       ┌────────────┐      ┌──────────────┐      ┌──────────────┐
//!       │SearchClient│      │DocumentFetcher│     │  Clarifier   │
//!       │ ≤1.2s      │      │ ≤1.2s         │     │ model ≤1.4s  │
//!       └─────┬──────┘      └──────┬───────┘      │ or static    │
//!             └────────┬───────────┘              └──────────────┘
//!                      ▼
//!          FallbackBackend(v2 API → v1 API)
//! ```
//!
//! ## Module Overview
//!
//! - [`config`] - Environment-based configuration: secrets, base URLs, budgets
//! - [`models`] - Wire and domain types: `SlashCommand`, `Query`, `Reply`, `Document`
//! - [`deadline`] - Budgeted calls that resolve to a value or `TimedOut`
//! - [`backend`] - Document API trait, HTTP variants, fallback, absorbing clients
//! - [`llm`] - Chat-completion client for Ollama or OpenAI-compatible APIs
//! - [`clarify`] - Generic-query detection and grounded clarification replies
//! - [`responder`] - The per-request decision core
//! - [`delivery`] - Deferred reply delivery to the callback URL
//! - [`api`] - Axum handlers for the slash command and health check
//! - [`state`] - Shared, immutable application state

pub mod api;
pub mod backend;
pub mod clarify;
pub mod config;
pub mod deadline;
pub mod delivery;
pub mod llm;
pub mod models;
pub mod responder;
pub mod state;
