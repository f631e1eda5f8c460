pub mod chat;
#[cfg(test)]
pub mod fake_upstream;

pub use chat::{request_critique, CritiquePrompt, UpstreamError};
