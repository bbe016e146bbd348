//! Request and response payloads of the admin backend.
//!
//! Plain serde shapes; the backend owns every rule about them.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login answers name the token differently depending on backend version.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: Option<String>,
    pub access_token: Option<String>,
    pub jwt: Option<String>,
}

impl LoginResponse {
    pub fn into_token(self) -> Option<String> {
        self.token
            .or(self.access_token)
            .or(self.jwt)
            .filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub items: Vec<T>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRow {
    pub id: String,
    pub user_name: String,
    pub email: String,
    pub role: String,
    pub is_pro: bool,
    pub online: bool,
    pub total_coins: i64,
    pub total_gmails: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Wallet {
    pub balance: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetail {
    pub id: String,
    pub user_name: String,
    pub email: String,
    pub role: String,
    pub is_pro: bool,
    #[serde(default)]
    pub last_seen_utc: Option<String>,
    pub online: bool,
    pub total_gmails: i64,
    pub wallet: Wallet,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletTx {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub amount: i64,
    #[serde(default)]
    pub note: Option<String>,
    pub created_at_utc: String,
}

/// Body of credit-by-username and debit-by-username.
#[derive(Debug, Clone, Serialize)]
pub struct WalletAdjustment {
    pub username: String,
    pub amount: i64,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletAdjustmentResult {
    pub user_id: String,
    pub username: String,
    pub wallet: Wallet,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardCode {
    pub id: String,
    pub code: String,
    pub amount: i64,
    pub is_redeemed: bool,
    #[serde(default)]
    pub redeemed_by_user_id: Option<String>,
    #[serde(default)]
    pub redeemed_at_utc: Option<String>,
    #[serde(default)]
    pub created_at_utc: Option<String>,
    #[serde(default)]
    pub expires_at_utc: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RewardFilter {
    #[default]
    All,
    Redeemed,
    Unredeemed,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkRewardCodes {
    pub amount: i64,
    pub quantity: u32,
    pub expires_at_utc: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardCodeSample {
    pub code: String,
    pub amount: i64,
    #[serde(default)]
    pub expires_at_utc: Option<String>,
}

/// The bulk endpoint answers with PascalCase keys.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BulkRewardResult {
    pub amount: i64,
    pub quantity: u32,
    #[serde(default)]
    pub expires_at_utc: Option<String>,
    #[serde(default)]
    pub sample: Vec<RewardCodeSample>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MonthlyCredit {
    pub username: String,
    pub month: String,
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CreditsMonthly {
    pub year: i32,
    pub months: Vec<String>,
    pub items: Vec<MonthlyCredit>,
}
