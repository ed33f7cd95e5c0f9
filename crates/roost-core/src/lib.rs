//! Core roost library (parser, transcript, agent, provider, tools, config).

pub mod agent;
pub mod config;
pub mod document;
pub mod parser;
pub mod prompts;
pub mod provider;
pub mod tools;
pub mod transcript;
