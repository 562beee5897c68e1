//! CSRF protection for state-changing requests.
//!
//! Unsafe methods must echo the `XSRF-TOKEN` cookie in the `X-XSRF-TOKEN`
//! header, and if the browser sent an `Origin` it has to be either the host
//! the request was addressed to or one of the trusted origins. HTTPS requests
//! without an `Origin` fall back to the same check on the `Referer`.
//! Responses to requests without a CSRF cookie get a fresh one.

use axum::http::{header, HeaderMap, HeaderValue, Method, Request};
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;
use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};
use tower::{Layer, Service};
use url::Url;
use uuid::Uuid;

use super::cookies::{csrf_cookie, CSRF_COOKIE_NAME, CSRF_HEADER_NAME};
use super::origin::OriginPolicy;
use crate::utils::error::AppError;

/// Headers set by the reverse proxy in front of the server.
const FORWARDED_PROTO: &str = "x-forwarded-proto";
const FORWARDED_HOST: &str = "x-forwarded-host";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsrfRejection {
    UntrustedOrigin,
    MissingReferer,
    MalformedReferer,
    InsecureReferer,
    UntrustedReferer,
    MissingCookie,
    MissingToken,
    TokenMismatch,
}

impl CsrfRejection {
    pub fn reason(&self) -> &'static str {
        match self {
            CsrfRejection::UntrustedOrigin => "CSRF failed: origin checking failed",
            CsrfRejection::MissingReferer => "CSRF failed: Referer checking failed - no Referer",
            CsrfRejection::MalformedReferer => {
                "CSRF failed: Referer checking failed - Referer is malformed"
            }
            CsrfRejection::InsecureReferer => {
                "CSRF failed: Referer checking failed - Referer is insecure while host is secure"
            }
            CsrfRejection::UntrustedReferer => {
                "CSRF failed: Referer checking failed - Referer does not match any trusted origins"
            }
            CsrfRejection::MissingCookie => "CSRF failed: CSRF cookie not set",
            CsrfRejection::MissingToken => "CSRF failed: CSRF token missing",
            CsrfRejection::TokenMismatch => "CSRF failed: CSRF token incorrect",
        }
    }
}

#[derive(Clone)]
pub struct CsrfLayer {
    policy: Arc<OriginPolicy>,
}

impl CsrfLayer {
    pub fn new(policy: Arc<OriginPolicy>) -> Self {
        Self { policy }
    }
}

impl<S> Layer<S> for CsrfLayer {
    type Service = CsrfService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CsrfService {
            inner,
            policy: self.policy.clone(),
        }
    }
}

#[derive(Clone)]
pub struct CsrfService<S> {
    inner: S,
    policy: Arc<OriginPolicy>,
}

impl<S, ReqBody> Service<Request<ReqBody>> for CsrfService<S>
where
    S: Service<Request<ReqBody>, Response = Response>,
{
    type Response = Response;
    type Error = S::Error;
    type Future = CsrfFuture<S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<ReqBody>) -> Self::Future {
        let jar = CookieJar::from_headers(request.headers());
        let cookie_token = jar.get(CSRF_COOKIE_NAME).map(|cookie| cookie.value().to_string());

        if let Err(rejection) = verify(
            &self.policy,
            request.method(),
            request.headers(),
            cookie_token.as_deref(),
        ) {
            tracing::warn!(
                method = %request.method(),
                uri = %request.uri(),
                "{}",
                rejection.reason()
            );
            return CsrfFuture::Rejected {
                response: Some(AppError::Forbidden(rejection.reason().to_string()).into_response()),
            };
        }

        let issue_cookie = match cookie_token {
            Some(_) => None,
            None => new_cookie_header(&self.policy),
        };

        CsrfFuture::Inner {
            future: self.inner.call(request),
            issue_cookie,
        }
    }
}

#[pin_project::pin_project(project = CsrfFutureProj)]
pub enum CsrfFuture<F> {
    Rejected {
        response: Option<Response>,
    },
    Inner {
        #[pin]
        future: F,
        issue_cookie: Option<HeaderValue>,
    },
}

impl<F, E> Future for CsrfFuture<F>
where
    F: Future<Output = Result<Response, E>>,
{
    type Output = Result<Response, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.project() {
            CsrfFutureProj::Rejected { response } => match response.take() {
                Some(response) => Poll::Ready(Ok(response)),
                None => panic!("CsrfFuture polled after completion"),
            },
            CsrfFutureProj::Inner {
                future,
                issue_cookie,
            } => match future.poll(cx) {
                Poll::Ready(Ok(mut response)) => {
                    if let Some(cookie) = issue_cookie.take() {
                        response.headers_mut().append(header::SET_COOKIE, cookie);
                    }
                    Poll::Ready(Ok(response))
                }
                Poll::Ready(Err(e)) => Poll::Ready(Err(e)),
                Poll::Pending => Poll::Pending,
            },
        }
    }
}

fn new_cookie_header(policy: &OriginPolicy) -> Option<HeaderValue> {
    let token = Uuid::new_v4().simple().to_string();
    let cookie = csrf_cookie(policy, token).to_string();
    match HeaderValue::from_str(&cookie) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::error!("CSRF: could not encode cookie: {}", e);
            None
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

fn is_secure_request(headers: &HeaderMap) -> bool {
    header_str(headers, FORWARDED_PROTO).is_some_and(|proto| proto.eq_ignore_ascii_case("https"))
}

/// Origin the request was addressed to, as seen by the browser.
fn request_origin(headers: &HeaderMap) -> Option<String> {
    let scheme = if is_secure_request(headers) {
        "https"
    } else {
        "http"
    };
    let host = header_str(headers, FORWARDED_HOST)
        .and_then(|hosts| hosts.split(',').next())
        .map(str::trim)
        .or_else(|| header_str(headers, header::HOST.as_str()))?;

    Some(format!("{}://{}", scheme, host.to_ascii_lowercase()))
}

pub fn verify(
    policy: &OriginPolicy,
    method: &Method,
    headers: &HeaderMap,
    cookie_token: Option<&str>,
) -> Result<(), CsrfRejection> {
    if method.is_safe() {
        return Ok(());
    }

    if let Some(origin) = headers.get(header::ORIGIN) {
        let origin = origin
            .to_str()
            .map_err(|_| CsrfRejection::UntrustedOrigin)?;
        let same_origin = request_origin(headers).as_deref() == Some(origin);
        if !same_origin && !policy.is_trusted_origin(origin) {
            return Err(CsrfRejection::UntrustedOrigin);
        }
    } else if is_secure_request(headers) {
        verify_referer(policy, headers)?;
    }

    let cookie_token = cookie_token
        .filter(|token| !token.is_empty())
        .ok_or(CsrfRejection::MissingCookie)?;
    let header_token = headers
        .get(CSRF_HEADER_NAME)
        .and_then(|value| value.to_str().ok())
        .filter(|token| !token.is_empty())
        .ok_or(CsrfRejection::MissingToken)?;

    if !constant_time_eq(cookie_token.as_bytes(), header_token.as_bytes()) {
        return Err(CsrfRejection::TokenMismatch);
    }
    Ok(())
}

fn verify_referer(policy: &OriginPolicy, headers: &HeaderMap) -> Result<(), CsrfRejection> {
    let referer = headers
        .get(header::REFERER)
        .ok_or(CsrfRejection::MissingReferer)?;
    let referer = referer
        .to_str()
        .ok()
        .and_then(|value| Url::parse(value).ok())
        .filter(|url| url.has_host())
        .ok_or(CsrfRejection::MalformedReferer)?;

    if referer.scheme() != "https" {
        return Err(CsrfRejection::InsecureReferer);
    }

    let origin = referer.origin().ascii_serialization();
    let same_origin = request_origin(headers).as_deref() == Some(origin.as_str());
    if !same_origin && !policy.is_trusted_origin(&origin) {
        return Err(CsrfRejection::UntrustedReferer);
    }
    Ok(())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
