pub mod config;
pub mod engine;
pub mod llm;
pub mod pipeline;
pub mod search;
pub mod writer;
