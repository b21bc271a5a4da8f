// Proxy module - HTTP server that forwards requests to the inference backend
//
// Every request is forwarded to the same path on the backend. JSON POSTs to
// api/chat and api/generate are first augmented with context fetched from the
// vector-search service; everything else passes through untouched.
//
// Request flow:
//   route::AugmentableRoute::classify → augmentation::augment (retrieval::ContextRetriever)
//   → handlers::{buffered, streaming} → caller

mod augmentation;
mod error;
mod handlers;
mod headers;
pub mod retrieval;
mod route;
mod server;
mod state;

#[cfg(test)]
mod test_support;

pub use handlers::proxy_handler;
pub use retrieval::ContextRetriever;
pub use server::start_proxy;
