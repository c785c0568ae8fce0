//! Stream Frame Codec
//!
//! Decodes inbound JSON frames into domain events and encodes the
//! outbound subscribe frame. A `crypto_update` frame carries a mapping of
//! symbol to ticker fields whose **values** become one full-replacement
//! ticker batch. An `exchange_update` frame carries a two-level mapping
//! (symbol -> exchange -> quote) that is flattened so every leaf quote
//! appears exactly once.
//!
//! Malformed frames produce a `DecodeError`; callers log and drop them
//! without touching the store.

use serde_json::Value;

use crate::domain::events::MarketEvent;
use crate::infrastructure::stream::messages::{
    ExchangeQuoteFields, SubscribeRequest, TickerFields,
};

/// Codec errors.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// Frame was not valid JSON.
    #[error("JSON codec error: {0}")]
    Json(#[from] serde_json::Error),

    /// Frame has no string `type` field.
    #[error("frame missing `type` field")]
    MissingType,

    /// Frame `type` is not part of the grammar.
    #[error("unknown frame type: {0}")]
    UnknownType(String),

    /// Frame `data` is missing or has the wrong shape.
    #[error("invalid frame data: {0}")]
    InvalidData(String),
}

/// JSON codec for the multiplexed market feed.
#[derive(Debug, Default, Clone)]
pub struct JsonCodec;

impl JsonCodec {
    /// Create a new JSON codec.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Decode one inbound frame into a domain event.
    ///
    /// # Errors
    ///
    /// Returns a `DecodeError` for non-JSON payloads, frames without a
    /// `type`, unknown types, and malformed `data` mappings.
    pub fn decode(&self, text: &str) -> Result<MarketEvent, DecodeError> {
        let value: Value = serde_json::from_str(text)?;

        let msg_type = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or(DecodeError::MissingType)?;

        match msg_type {
            "crypto_update" => Self::decode_crypto_update(&value),
            "exchange_update" => Self::decode_exchange_update(&value),
            other => Err(DecodeError::UnknownType(other.to_string())),
        }
    }

    /// Encode the outbound subscribe frame.
    ///
    /// # Errors
    ///
    /// Returns a `DecodeError` if serialization fails.
    pub fn subscribe_frame(&self) -> Result<String, DecodeError> {
        Ok(serde_json::to_string(&SubscribeRequest::new())?)
    }

    /// Extract the mapping's values as one ticker batch. Iteration order
    /// is irrelevant; replacement is keyed per symbol downstream.
    fn decode_crypto_update(value: &Value) -> Result<MarketEvent, DecodeError> {
        let data = value
            .get("data")
            .and_then(Value::as_object)
            .ok_or_else(|| DecodeError::InvalidData("crypto_update data is not a mapping".to_string()))?;

        let mut batch = Vec::with_capacity(data.len());
        for (symbol, fields) in data {
            let fields: TickerFields = serde_json::from_value(fields.clone())?;
            batch.push(fields.into_snapshot(symbol));
        }

        Ok(MarketEvent::TickerBatchReplaced(batch))
    }

    /// Flatten the two-level symbol -> exchange -> quote mapping into one
    /// list; every leaf value appears exactly once.
    fn decode_exchange_update(value: &Value) -> Result<MarketEvent, DecodeError> {
        let data = value
            .get("data")
            .and_then(Value::as_object)
            .ok_or_else(|| {
                DecodeError::InvalidData("exchange_update data is not a mapping".to_string())
            })?;

        let mut batch = Vec::new();
        for (symbol, exchanges) in data {
            let exchanges = exchanges.as_object().ok_or_else(|| {
                DecodeError::InvalidData(format!("exchange_update entry for {symbol} is not a mapping"))
            })?;

            for (exchange, quote) in exchanges {
                let fields: ExchangeQuoteFields = serde_json::from_value(quote.clone())?;
                batch.push(fields.into_quote(symbol, exchange));
            }
        }

        Ok(MarketEvent::ExchangeBatchReplaced(batch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crypto_update_extracts_mapping_values() {
        let codec = JsonCodec::new();
        let frame = r#"{
            "type": "crypto_update",
            "data": {
                "BTC/USD": {"price": 109000.0, "price_24h_change": 1.5, "volume_24h": 40000000000.0},
                "ETH/USD": {"price": 4400.0, "price_24h_change": -0.8, "volume_24h": 15000000000.0}
            }
        }"#;

        let event = codec.decode(frame).unwrap();
        match event {
            MarketEvent::TickerBatchReplaced(batch) => {
                assert_eq!(batch.len(), 2);
                let mut symbols: Vec<_> = batch.iter().map(|t| t.symbol.as_str()).collect();
                symbols.sort_unstable();
                assert_eq!(symbols, vec!["BTC/USD", "ETH/USD"]);
            }
            other => panic!("expected TickerBatchReplaced, got {other:?}"),
        }
    }

    #[test]
    fn exchange_update_flattens_every_leaf_exactly_once() {
        let codec = JsonCodec::new();
        let frame = r#"{
            "type": "exchange_update",
            "data": {
                "BTC/USD": {
                    "uniswap": {"price": 109010.0, "volume": 120.5, "status": "trending"},
                    "sushiswap": {"price": 108990.0, "volume": 88.1, "status": "limited"}
                }
            }
        }"#;

        let event = codec.decode(frame).unwrap();
        match event {
            MarketEvent::ExchangeBatchReplaced(batch) => {
                assert_eq!(batch.len(), 2);
                assert!(batch.iter().all(|q| q.symbol == "BTC/USD"));
                let mut exchanges: Vec<_> = batch.iter().map(|q| q.exchange.as_str()).collect();
                exchanges.sort_unstable();
                assert_eq!(exchanges, vec!["sushiswap", "uniswap"]);
            }
            other => panic!("expected ExchangeBatchReplaced, got {other:?}"),
        }
    }

    #[test]
    fn exchange_update_flattens_across_symbols() {
        let codec = JsonCodec::new();
        let frame = r#"{
            "type": "exchange_update",
            "data": {
                "BTC/USD": {"uniswap": {"price": 1.0}},
                "ETH/USD": {"uniswap": {"price": 2.0}, "kraken": {"price": 3.0}}
            }
        }"#;

        match codec.decode(frame).unwrap() {
            MarketEvent::ExchangeBatchReplaced(batch) => assert_eq!(batch.len(), 3),
            other => panic!("expected ExchangeBatchReplaced, got {other:?}"),
        }
    }

    #[test]
    fn non_json_frame_is_a_decode_error() {
        let codec = JsonCodec::new();
        assert!(matches!(codec.decode("not json"), Err(DecodeError::Json(_))));
    }

    #[test]
    fn missing_type_is_a_decode_error() {
        let codec = JsonCodec::new();
        assert!(matches!(
            codec.decode(r#"{"data": {}}"#),
            Err(DecodeError::MissingType)
        ));
    }

    #[test]
    fn unknown_type_is_a_decode_error() {
        let codec = JsonCodec::new();
        match codec.decode(r#"{"type": "portfolio_update", "data": {}}"#) {
            Err(DecodeError::UnknownType(t)) => assert_eq!(t, "portfolio_update"),
            other => panic!("expected UnknownType, got {other:?}"),
        }
    }

    #[test]
    fn malformed_data_is_a_decode_error() {
        let codec = JsonCodec::new();
        assert!(matches!(
            codec.decode(r#"{"type": "crypto_update", "data": [1, 2, 3]}"#),
            Err(DecodeError::InvalidData(_))
        ));
    }

    #[test]
    fn subscribe_frame_matches_wire_contract() {
        let codec = JsonCodec::new();
        assert_eq!(codec.subscribe_frame().unwrap(), r#"{"type":"subscribe"}"#);
    }
}
