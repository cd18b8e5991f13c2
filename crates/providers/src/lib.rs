//! Model gateway implementations for Parley.
//!
//! All gateways implement the `parley_core::ModelGateway` trait.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatGateway;
