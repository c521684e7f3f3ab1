//! LLM integration for partner assessments.
//!
//! This module builds the assessment prompt and talks to the hosted model.

pub mod gemini;
pub mod prompt;

pub use gemini::{GeminiClient, GeminiConfig};
