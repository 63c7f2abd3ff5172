//! Recordkeeper HTTP API.
//!
//! Handler modules per resource plus the helpers they share: reading the
//! caller credential and parsing paging query parameters.
pub mod error;
pub mod officers;
pub mod openapi;
pub mod reports;
pub mod system;
pub mod types;

use crate::api::error::{ApiError, api_validation_error};
use crate::model::PageRequest;
use axum::extract::rejection::JsonRejection;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use std::collections::HashMap;
use std::str::FromStr;

/// Largest `itemsPerPage` a list request may ask for.
pub(crate) const MAX_PAGE_SIZE: u32 = 1_000;

/// Raw `authorization` header value. Its presence is a request-shape
/// requirement; whether it names anyone is decided by the identity resolver.
pub(crate) fn credential(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| api_validation_error("authorization header is required"))
}

pub(crate) fn query_param<T: FromStr>(
    params: &HashMap<String, String>,
    key: &str,
) -> Result<Option<T>, ApiError> {
    match params.get(key) {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| api_validation_error(&format!("invalid {key}"))),
    }
}

/// `currentPage` / `itemsPerPage`, falling back to page 1 and the configured
/// default size. Returns the effective page size alongside the request.
/// Sizes above [`MAX_PAGE_SIZE`] are rejected so offsets stay within `i64`.
pub(crate) fn page_request(
    params: &HashMap<String, String>,
    default_page_size: u32,
) -> Result<(PageRequest, u32), ApiError> {
    let page = query_param::<u32>(params, "currentPage")?.unwrap_or(1);
    let per_page = match query_param::<u32>(params, "itemsPerPage")? {
        Some(size) if size > MAX_PAGE_SIZE => {
            return Err(api_validation_error(&format!(
                "itemsPerPage must be at most {MAX_PAGE_SIZE}"
            )));
        }
        Some(size) => size,
        None => default_page_size.min(MAX_PAGE_SIZE),
    };
    let request = PageRequest::new(page, per_page);
    Ok((request, request.per_page))
}

pub(crate) fn json_body<T>(body: Result<axum::Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|axum::Json(value)| value)
        .map_err(|rejection| api_validation_error(&rejection.body_text()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn credential_requires_non_empty_header() {
        let mut headers = HeaderMap::new();
        let err = credential(&headers).expect_err("missing");
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        headers.insert(AUTHORIZATION, "  ".parse().unwrap());
        assert!(credential(&headers).is_err());

        headers.insert(AUTHORIZATION, "Bearer abc".parse().unwrap());
        assert_eq!(credential(&headers).expect("present"), "Bearer abc");
    }

    #[test]
    fn page_request_defaults_and_overrides() {
        let (request, per_page) = page_request(&params(&[]), 20).expect("defaults");
        assert_eq!(request.page, 1);
        assert_eq!(per_page, 20);

        let (request, per_page) =
            page_request(&params(&[("currentPage", "3"), ("itemsPerPage", "5")]), 20)
                .expect("explicit");
        assert_eq!(request.page, 3);
        assert_eq!(per_page, 5);
        assert_eq!(request.offset(), 10);
    }

    #[test]
    fn page_request_rejects_garbage() {
        let err = page_request(&params(&[("itemsPerPage", "lots")]), 20).expect_err("invalid");
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.body.message.contains("itemsPerPage"));
    }

    #[test]
    fn page_request_caps_page_size() {
        let err = page_request(
            &params(&[("currentPage", "4294967295"), ("itemsPerPage", "4294967295")]),
            20,
        )
        .expect_err("oversized page");
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.body.message.contains("at most"));

        let (request, per_page) = page_request(
            &params(&[("currentPage", "4294967295"), ("itemsPerPage", "1000")]),
            20,
        )
        .expect("largest page");
        assert_eq!(per_page, MAX_PAGE_SIZE);
        assert!(i64::try_from(request.offset()).is_ok());

        let (_, per_page) = page_request(&params(&[]), u32::MAX).expect("default");
        assert_eq!(per_page, MAX_PAGE_SIZE);
    }
}
