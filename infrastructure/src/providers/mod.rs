//! LLM provider adapters

mod openai_compatible;

pub use openai_compatible::OpenAiCompatibleGateway;
