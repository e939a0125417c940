//! Session cookie
//!
//! The `session_id` cookie is an opaque token used only as the throttle key.
//! It is never decoded or validated beyond being non-blank.

use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{HeaderValue, header::SET_COOKIE, request::Parts},
    response::Response,
};
use headers::{Cookie, HeaderMapExt};
use types::ids::SessionId;

pub const SESSION_COOKIE: &str = "session_id";

/// Session of the current request, newly issued if the client sent none.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    /// The token was minted for this request and must be sent back.
    pub issued: bool,
}

impl Session {
    /// `Set-Cookie` header value carrying this session.
    pub fn cookie(&self) -> Option<HeaderValue> {
        HeaderValue::from_str(&format!(
            "{SESSION_COOKIE}={}; HttpOnly; Path=/; SameSite=Lax",
            self.id
        ))
        .ok()
    }

    /// Attach the cookie to `response` when the session was just issued.
    pub fn attach(&self, mut response: Response) -> Response {
        if self.issued {
            if let Some(cookie) = self.cookie() {
                response.headers_mut().append(SET_COOKIE, cookie);
            }
        }
        response
    }
}

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let existing = parts
            .headers
            .typed_get::<Cookie>()
            .and_then(|cookie| cookie.get(SESSION_COOKIE).and_then(SessionId::from_token));

        Ok(match existing {
            Some(id) => Session { id, issued: false },
            None => Session {
                id: SessionId::new(),
                issued: true,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Request, header::COOKIE};
    use axum::response::IntoResponse;

    async fn extract(cookie: Option<&str>) -> Session {
        let mut request = Request::builder().uri("/status");
        if let Some(cookie) = cookie {
            request = request.header(COOKIE, cookie);
        }
        let (mut parts, ()) = request.body(()).unwrap().into_parts();
        Session::from_request_parts(&mut parts, &()).await.unwrap()
    }

    #[tokio::test]
    async fn test_reuses_existing_cookie() {
        let session = extract(Some("theme=dark; session_id=abc-123")).await;
        assert_eq!(session.id.as_str(), "abc-123");
        assert!(!session.issued);
    }

    #[tokio::test]
    async fn test_issues_when_missing_or_blank() {
        let missing = extract(None).await;
        assert!(missing.issued);

        let blank = extract(Some("session_id=")).await;
        assert!(blank.issued);
        assert_ne!(blank.id.as_str(), "");
    }

    #[tokio::test]
    async fn test_attach_sets_cookie_only_when_issued() {
        let issued = extract(None).await;
        let response = issued.attach(().into_response());
        let cookie = response.headers()[SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with(&format!("session_id={}", issued.id)));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));

        let existing = extract(Some("session_id=abc")).await;
        let response = existing.attach(().into_response());
        assert!(response.headers().get(SET_COOKIE).is_none());
    }
}
