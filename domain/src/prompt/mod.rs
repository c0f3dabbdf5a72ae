//! Prompt templates for discussion turns, speaker selection and adjudication

pub mod template;

pub use template::PromptTemplate;
