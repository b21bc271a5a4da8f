//! Route classification (the augmentation eligibility gate)
//!
//! Computed once per request. Only a JSON `POST` to one of the two inference
//! endpoints is augmentable; everything else is forwarded untouched.

use axum::http::{HeaderMap, Method};

pub(crate) const CHAT_PATH: &str = "api/chat";
pub(crate) const GENERATE_PATH: &str = "api/generate";

/// How a request is handled on its way upstream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AugmentableRoute {
    /// `api/chat`: structured message list
    Chat,
    /// `api/generate`: flat prompt string
    Generate,
    /// Anything else: raw pass-through
    Opaque,
}

impl AugmentableRoute {
    /// Classify a request by method, path (without leading `/`) and content type
    pub fn classify(method: &Method, path: &str, content_type: &str) -> Self {
        if method != Method::POST || !content_type.contains("application/json") {
            return Self::Opaque;
        }

        match path {
            CHAT_PATH => Self::Chat,
            GENERATE_PATH => Self::Generate,
            _ => Self::Opaque,
        }
    }

    /// Classify straight from inbound request parts
    pub fn from_request(method: &Method, path: &str, headers: &HeaderMap) -> Self {
        let content_type = headers
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        Self::classify(method, path, content_type)
    }

    pub fn is_augmentable(&self) -> bool {
        !matches!(self, Self::Opaque)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::Generate => "generate",
            Self::Opaque => "opaque",
        }
    }
}
