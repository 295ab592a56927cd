//! Assignee suggestion adapter for OpenAI-compatible chat completion APIs.

mod dto;
mod http_suggester;

pub use http_suggester::{ChatCompletionsSuggester, SuggesterEndpoint};
