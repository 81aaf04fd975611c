pub mod prompts;

#[cfg(feature = "gemini")]
pub mod client;
#[cfg(feature = "gemini")]
pub mod gemini;
#[cfg(feature = "gemini")]
pub mod types;

pub use prompts::*;

#[cfg(feature = "gemini")]
pub use client::GeminiClient;
#[cfg(feature = "gemini")]
pub use gemini::GeminiSuggester;
