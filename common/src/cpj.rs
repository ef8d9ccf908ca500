//! Parsed chat-message envelopes (CPJ).
//!
//! These describe trade calls extracted from social/chat sources. They carry
//! ingestion provenance only and are never lens-scored.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    Telegram,
    Discord,
    Twitter,
    Slack,
    Other,
}

impl ProviderType {
    pub const NAMES: &'static [&'static str] = &["telegram", "discord", "twitter", "slack", "other"];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Long,
    Short,
    Buy,
    Sell,
}

impl TradeSide {
    pub const NAMES: &'static [&'static str] = &["long", "short", "buy", "sell"];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketType {
    Spot,
    Perp,
    Futures,
    #[serde(rename = "option")]
    Options,
}

impl MarketType {
    pub const NAMES: &'static [&'static str] = &["spot", "perp", "futures", "option"];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageProvenance {
    pub provider_type: ProviderType,
    pub provider_id: String,
    pub message_id: String,
    pub posted_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
}

impl MessageProvenance {
    pub const REQUIRED: &'static [&'static str] =
        &["providerType", "providerId", "messageId", "postedAt"];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedCall {
    pub symbol_raw: String,
    pub side: TradeSide,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_type: Option<MarketType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_range: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_loss: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub take_profits: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leverage: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseInfo {
    pub parser_id: String,
    pub parser_version: String,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warnings: Option<Vec<String>>,
}

/// A parsed chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedMessage {
    pub schema: String,
    pub provenance: MessageProvenance,
    pub extracted: ExtractedCall,
    pub parse: ParseInfo,
}
