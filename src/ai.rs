//! Generative-language collaborator: the generator trait, the Gemini client
//! and the prompt templates.

pub mod client;
pub mod prompts;
