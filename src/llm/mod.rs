pub mod client;
pub mod gateway;

pub use client::LLMClient;
pub use gateway::{CompletionGateway, GatewayError};
