//! `Path` and `Query` extractors whose rejections render as [`ApiError`], so a
//! malformed id or filter gets the same JSON envelope as every other failure.

use axum::extract::FromRequestParts;

use crate::error::ApiError;

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct Path<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct Query<T>(pub T);
