//! Model provider implementations

mod factory;
mod gemini;
mod http_client;

pub use factory::LlmProviderFactory;
pub use gemini::{DEFAULT_GEMINI_BASE_URL, GeminiProvider};
pub use http_client::{ByteStream, HttpClient, HttpClientTrait, classify_http_error};

#[cfg(test)]
pub use http_client::mock::MockHttpClient;
