//! Client-side API resolution for the admin dashboard backend.
//!
//! # Overview
//! Builds `HttpRequest` values and normalizes `HttpResponse` values without
//! touching the network (host-does-IO pattern). The host executes the actual
//! HTTP round-trip, so resolution and normalization stay deterministic and
//! testable.
//!
//! # Design
//! - `EnvironmentContext` gathers every deployment input once; `ApiResolver`
//!   turns it into a single routing decision (direct upstream or same-origin
//!   relay).
//! - `TokenStore` owns the bearer token; `auth_headers` injects it.
//! - `normalize` maps non-2xx responses to `ApiError::Upstream` carrying the
//!   literal status and raw body, and never fails on a 2xx.
//! - DTOs are defined independently from the mock upstream; integration
//!   tests catch schema drift.

pub mod auth;
pub mod client;
pub mod env;
pub mod error;
pub mod http;
pub mod normalize;
pub mod resolver;
pub mod types;

pub use auth::{auth_headers, FileTokenStore, MemoryTokenStore, TokenStore, TOKEN_KEY};
pub use client::AdminClient;
pub use env::{EnvironmentContext, Runtime};
pub use error::{ApiError, StoreError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use normalize::{decode, normalize};
pub use resolver::{ApiResolver, Route};
