//! Generation backends for transit flows.
//!
//! The [`traits::GenerationBackend`] trait is the seam between the contract
//! layer and an external text-generation service; [`gemini`] implements it
//! over the Google Gemini HTTP API with the declared output shape passed as
//! a structural constraint. The constraint is advisory: callers must still
//! validate every reply against the output schema.

#![warn(missing_docs, clippy::pedantic)]

pub mod gemini;
pub mod traits;

mod http_client;
