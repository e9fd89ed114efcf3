//! Client identity for debouncing
//!
//! The first non-empty of: the `x-client-id` header, the first hop of
//! `x-forwarded-for`, or the peer socket IP. The value is used verbatim.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::HeaderMap;
use axum::http::request::Parts;

use crate::error::ApiError;

pub const CLIENT_ID_HEADER: &str = "x-client-id";
pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// Extracted client key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientKey(pub String);

impl<S> FromRequestParts<S> for ClientKey
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        derive_client_key(&parts.headers, peer)
            .map(ClientKey)
            .ok_or(ApiError::MissingClientKey)
    }
}

pub fn derive_client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
    header_value(headers, CLIENT_ID_HEADER)
        .or_else(|| {
            header_value(headers, FORWARDED_FOR_HEADER)
                .and_then(|v| v.split(',').next().map(|hop| hop.trim().to_string()))
                .filter(|hop| !hop.is_empty())
        })
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
