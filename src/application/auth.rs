use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use sha2::{Digest, Sha256};
use tracing::{Span, warn};

use crate::application::errors::{ApiError, AppError};
use crate::application::state::AppState;

/// Header carrying the caller's copy of the shared secret.
pub const RENDER_KEY_HEADER: &str = "x-key";

/// The configured shared secret, held as a SHA-256 digest.
///
/// Candidates are hashed and the digests compared, so the comparison does not
/// stop at the first differing byte of the secret. An empty secret matches
/// nothing.
#[derive(Clone)]
pub struct RenderKey {
    digest: Option<Vec<u8>>,
}

impl RenderKey {
    pub fn new(secret: &str) -> Self {
        let digest = (!secret.is_empty()).then(|| hash_key(secret.as_bytes()));
        Self { digest }
    }

    pub fn is_configured(&self) -> bool {
        self.digest.is_some()
    }

    pub fn matches(&self, candidate: &[u8]) -> bool {
        self.digest
            .as_deref()
            .is_some_and(|expected| hash_key(candidate) == expected)
    }
}

impl std::fmt::Debug for RenderKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderKey")
            .field("configured", &self.is_configured())
            .finish()
    }
}

fn hash_key(value: &[u8]) -> Vec<u8> {
    Sha256::digest(value).to_vec()
}

/// Extractor that succeeds only when the `X-KEY` header matches the
/// configured secret exactly.
#[derive(Debug, Clone, Copy)]
pub struct Authorized;

impl FromRequestParts<AppState> for Authorized {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(candidate) = parts.headers.get(RENDER_KEY_HEADER) else {
            warn!("render request without X-KEY header");
            return Err(AppError::Unauthorized.into());
        };

        if !state.render_key.matches(candidate.as_bytes()) {
            warn!("render request with mismatched X-KEY header");
            return Err(AppError::Unauthorized.into());
        }

        Span::current().record("authorized", true);
        Ok(Self)
    }
}
