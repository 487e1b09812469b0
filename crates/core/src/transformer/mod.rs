//! Proofreading transformation.
//!
//! A [`Transformer`] turns extracted document text into a structured
//! [`ProofreadResult`] under an editorial role. The production
//! implementation is [`LlmTransformer`], which talks to a chat model
//! through an [`LlmClient`].

mod config;
mod error;
mod llm;
mod llm_transformer;
mod roles;
mod traits;
mod types;
mod unavailable;

pub use config::{LlmConfig, LlmProvider};
pub use error::TransformError;
pub use llm::{
    create_llm_client, ChatCompletionsClient, CompletionRequest, CompletionResponse, LlmClient,
    LlmError, LlmUsage, OllamaClient,
};
pub use llm_transformer::{build_user_prompt, parse_proofread_response, LlmTransformer};
pub use roles::{RoleConfig, RolesConfig};
pub use traits::Transformer;
pub use types::{Correction, ProofreadResult};
pub use unavailable::UnavailableTransformer;
