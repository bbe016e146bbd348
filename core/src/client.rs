//! Request builder and response parser for the admin backend.
//!
//! # Design
//! `AdminClient` owns an `ApiResolver` (decided once from the environment)
//! and a `TokenStore`. Every `build_*` method resolves its logical path and
//! attaches the bearer header the same way, whatever the method. Parsing
//! goes through the response normalizer. The caller executes the HTTP
//! round-trip between `build_*` and `parse`, so nothing here does network
//! I/O.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::auth::{auth_headers, TokenStore};
use crate::error::{ApiError, StoreError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::normalize::{decode, normalize};
use crate::resolver::ApiResolver;
use crate::types::{BulkRewardCodes, LoginRequest, LoginResponse, RewardFilter, WalletAdjustment};

pub const LOGIN_PATH: &str = "/api/auth/login";

pub struct AdminClient<S> {
    resolver: ApiResolver,
    store: S,
}

impl<S: TokenStore> AdminClient<S> {
    pub fn new(resolver: ApiResolver, store: S) -> Self {
        Self { resolver, store }
    }

    pub fn resolver(&self) -> &ApiResolver {
        &self.resolver
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn is_authenticated(&self) -> bool {
        self.store.has_token()
    }

    /// A bare request to `path` carrying the auth header, if any.
    pub fn request(&self, method: HttpMethod, path: &str) -> HttpRequest {
        HttpRequest {
            method,
            url: self.resolver.resolve(path),
            headers: auth_headers(&self.store),
            body: None,
        }
    }

    pub fn json_request<B: Serialize>(
        &self,
        method: HttpMethod,
        path: &str,
        body: &B,
    ) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(body).map_err(|e| ApiError::Serialize(e.to_string()))?;
        let mut req = self.request(method, path);
        req.headers
            .insert(0, ("content-type".to_string(), "application/json".to_string()));
        req.body = Some(body);
        Ok(req)
    }

    // --- session ---

    pub fn build_login(&self, input: &LoginRequest) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, LOGIN_PATH, input)
    }

    /// Extract the token from a login response and store it.
    pub fn complete_login(&self, response: HttpResponse) -> Result<String, ApiError> {
        let login: LoginResponse = decode(response)?;
        let token = login
            .into_token()
            .ok_or_else(|| ApiError::Decode("login response carried no token".to_string()))?;
        self.store.set(&token)?;
        Ok(token)
    }

    pub fn logout(&self) -> Result<(), StoreError> {
        self.store.clear()
    }

    /// Policy hook for authentication rejections: on 401 the stored token is
    /// dropped and `true` tells the caller to send the user to login.
    pub fn handle_unauthorized(&self, err: &ApiError) -> bool {
        if !err.is_unauthorized() {
            return false;
        }
        if let Err(e) = self.store.clear() {
            tracing::warn!("failed to clear rejected token: {e}");
        }
        true
    }

    // --- users ---

    pub fn build_users_overview(&self, page: u32, page_size: u32, search: &str) -> HttpRequest {
        let query = encode_query(&[
            ("page", page.to_string()),
            ("pageSize", page_size.to_string()),
            ("search", search.to_string()),
        ]);
        self.request(HttpMethod::Get, &format!("/api/admin/users/overview?{query}"))
    }

    pub fn build_user_detail(&self, id: &str) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("/api/admin/users/{id}"))
    }

    pub fn build_wallet_txs(&self, id: &str, page: u32, page_size: u32) -> HttpRequest {
        let query = encode_query(&[("page", page.to_string()), ("pageSize", page_size.to_string())]);
        self.request(HttpMethod::Get, &format!("/api/admin/users/{id}/wallet-txs?{query}"))
    }

    // --- wallet ---

    pub fn build_credit(&self, input: &WalletAdjustment) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "/api/admin/users/credit-by-username", input)
    }

    pub fn build_debit(&self, input: &WalletAdjustment) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "/api/admin/users/debit-by-username", input)
    }

    pub fn build_credits_monthly(&self, year: i32) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("/api/admin/wallet/credits-monthly?year={year}"))
    }

    // --- reward codes ---

    pub fn build_reward_codes(&self, filter: RewardFilter) -> HttpRequest {
        let path = match filter {
            RewardFilter::All => "/api/admin/reward-codes",
            RewardFilter::Redeemed => "/api/admin/reward-codes?redeemed=true",
            RewardFilter::Unredeemed => "/api/admin/reward-codes?redeemed=false",
        };
        self.request(HttpMethod::Get, path)
    }

    pub fn build_bulk_reward_codes(&self, input: &BulkRewardCodes) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "/api/admin/reward-codes/bulk", input)
    }

    // --- responses ---

    /// Normalize a response and decode it into `T`.
    pub fn parse<T: DeserializeOwned>(&self, response: HttpResponse) -> Result<T, ApiError> {
        decode(response)
    }

    /// Normalize a response without committing to a shape.
    pub fn parse_value(&self, response: HttpResponse) -> Result<Value, ApiError> {
        normalize(response)
    }
}

fn encode_query(pairs: &[(&str, String)]) -> String {
    // Serializing string pairs cannot fail.
    serde_urlencoded::to_string(pairs).unwrap_or_default()
}
