//! Bearer token check for tool routes.

use axum::http::{header, HeaderMap};

use crate::error::{Result, WorkerError};

/// Accept the request when no secret is configured or the bearer token matches it.
pub fn authorize(secret: Option<&str>, headers: &HeaderMap) -> Result<()> {
    let Some(expected) = secret else {
        return Ok(());
    };

    let header = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(WorkerError::Unauthorized)?;

    let token = header.strip_prefix("Bearer ").unwrap_or(header).trim();
    if token == expected {
        Ok(())
    } else {
        Err(WorkerError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_no_secret_allows_all() {
        assert!(authorize(None, &HeaderMap::new()).is_ok());
    }

    #[test]
    fn test_bearer_token() {
        assert!(authorize(Some("abc"), &headers("Bearer abc")).is_ok());
        assert!(authorize(Some("abc"), &headers("Bearer abd")).is_err());
        assert!(matches!(
            authorize(Some("abc"), &HeaderMap::new()),
            Err(WorkerError::Unauthorized)
        ));
    }
}
