pub mod chat;

pub use chat::{ChatChoice, ChatCompletion, ChatCompletionRequest, ChatMessage, ResponseMessage, Usage};

pub mod telemetry;
