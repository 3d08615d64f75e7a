//! Read-only client for the gauge contract's reward views.
//!
//! Talks plain JSON-RPC `eth_call` against a configured endpoint; the three
//! view functions are fixed, so their calldata is encoded by hand.

use serde::{Deserialize, Serialize};
use std::fmt;

// keccak-256 selectors for the fixed view interface.
const SEL_REWARD_COUNT: &str = "963c94b9"; // reward_count()
const SEL_REWARD_TOKENS: &str = "54c49fe9"; // reward_tokens(uint256)
const SEL_REWARD_DATA: &str = "48e9c65e"; // reward_data(address)

/// Decoded `reward_data` return. Only `period_finish` drives alerting; the
/// rest is decoded here so callers never index into a raw word tuple.
#[derive(Debug, Clone, PartialEq)]
pub struct RewardData {
    #[allow(dead_code)]
    pub distributor: String,
    pub period_finish: u64,
    #[allow(dead_code)]
    pub rate: u128,
    #[allow(dead_code)]
    pub last_update: u64,
    #[allow(dead_code)]
    pub integral: u128,
}

/// A contract read failed. One error for the whole transport: network,
/// RPC-level and decode failures all surface the same way, no retry.
#[derive(Debug)]
pub enum RpcError {
    Http(String),
    Rpc(String),
    Decode(String),
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RpcError::Http(e) => write!(f, "contract read failed (http): {e}"),
            RpcError::Rpc(e) => write!(f, "contract read failed (rpc): {e}"),
            RpcError::Decode(e) => write!(f, "contract read failed (decode): {e}"),
        }
    }
}

impl std::error::Error for RpcError {}

/// The three reward views, plus the derived existence scan.
pub trait GaugeReader {
    async fn reward_count(&self, gauge: &str) -> Result<u64, RpcError>;
    async fn reward_token_at(&self, gauge: &str, index: u64) -> Result<String, RpcError>;
    async fn reward_data(&self, gauge: &str, token: &str) -> Result<RewardData, RpcError>;

    /// Linear scan over the gauge's reward tokens, case-insensitive match,
    /// short-circuits on the first hit. One read per index; reward counts
    /// are single digits in practice.
    async fn token_exists_on_gauge(&self, gauge: &str, token: &str) -> Result<bool, RpcError> {
        let count = self.reward_count(gauge).await?;
        for index in 0..count {
            let candidate = self.reward_token_at(gauge, index).await?;
            if candidate.eq_ignore_ascii_case(token) {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Fractional hours until `period_finish`. Integer seconds first, then
/// converted; negative when the stream already ran out, never clamped.
pub fn hours_remaining(period_finish: u64, now_unix: i64) -> f64 {
    let delta = period_finish as i64 - now_unix;
    delta as f64 / 3600.0
}

/// `eth_call` implementation over reqwest.
pub struct RpcGaugeReader {
    http: reqwest::Client,
    rpc_url: String,
}

#[derive(Serialize)]
struct RpcRequest {
    jsonrpc: &'static str,
    id: u64,
    method: &'static str,
    params: serde_json::Value,
}

#[derive(Deserialize)]
struct RpcResponse {
    result: Option<serde_json::Value>,
    error: Option<serde_json::Value>,
}

impl RpcGaugeReader {
    pub fn new(rpc_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            rpc_url,
        }
    }

    async fn eth_call(&self, to: &str, data: String) -> Result<String, RpcError> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method: "eth_call",
            params: serde_json::json!([{ "to": to, "data": data }, "latest"]),
        };

        let resp: RpcResponse = self
            .http
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| RpcError::Http(e.to_string()))?
            .json()
            .await
            .map_err(|e| RpcError::Http(e.to_string()))?;

        if let Some(err) = resp.error {
            return Err(RpcError::Rpc(err.to_string()));
        }

        match resp.result {
            Some(serde_json::Value::String(hex)) => Ok(hex),
            _ => Err(RpcError::Decode("missing result".to_string())),
        }
    }
}

impl GaugeReader for RpcGaugeReader {
    async fn reward_count(&self, gauge: &str) -> Result<u64, RpcError> {
        let result = self.eth_call(gauge, format!("0x{SEL_REWARD_COUNT}")).await?;
        word_to_u64(&first_word(&result)?)
    }

    async fn reward_token_at(&self, gauge: &str, index: u64) -> Result<String, RpcError> {
        let data = format!("0x{SEL_REWARD_TOKENS}{}", encode_uint(index));
        let result = self.eth_call(gauge, data).await?;
        Ok(word_to_address(&first_word(&result)?))
    }

    async fn reward_data(&self, gauge: &str, token: &str) -> Result<RewardData, RpcError> {
        let data = format!("0x{SEL_REWARD_DATA}{}", encode_address(token)?);
        let result = self.eth_call(gauge, data).await?;
        decode_reward_data(&result)
    }
}

// ── ABI encode/decode helpers ───────────────────────────────────

fn encode_uint(value: u64) -> String {
    format!("{value:064x}")
}

fn encode_address(addr: &str) -> Result<String, RpcError> {
    let hex = addr
        .strip_prefix("0x")
        .ok_or_else(|| RpcError::Decode(format!("not an address: '{addr}'")))?;
    if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(RpcError::Decode(format!("not an address: '{addr}'")));
    }
    Ok(format!("{:0>64}", hex.to_lowercase()))
}

/// Splits an `eth_call` result into 32-byte words.
fn result_words(result: &str) -> Result<Vec<&str>, RpcError> {
    let hex = result.strip_prefix("0x").unwrap_or(result);
    if hex.is_empty() || hex.len() % 64 != 0 {
        return Err(RpcError::Decode(format!(
            "unexpected return length {} hex chars",
            hex.len()
        )));
    }
    hex.as_bytes()
        .chunks(64)
        .map(|chunk| {
            std::str::from_utf8(chunk)
                .map_err(|_| RpcError::Decode("non-ascii return data".to_string()))
        })
        .collect()
}

fn first_word(result: &str) -> Result<String, RpcError> {
    Ok(result_words(result)?[0].to_string())
}

fn word_to_u64(word: &str) -> Result<u64, RpcError> {
    let (high, low) = word.split_at(48);
    if high.bytes().any(|b| b != b'0') {
        return Err(RpcError::Decode(format!("uint64 overflow in word {word}")));
    }
    u64::from_str_radix(low, 16).map_err(|e| RpcError::Decode(e.to_string()))
}

fn word_to_u128(word: &str) -> Result<u128, RpcError> {
    let (high, low) = word.split_at(32);
    if high.bytes().any(|b| b != b'0') {
        return Err(RpcError::Decode(format!("uint128 overflow in word {word}")));
    }
    u128::from_str_radix(low, 16).map_err(|e| RpcError::Decode(e.to_string()))
}

fn word_to_address(word: &str) -> String {
    format!("0x{}", &word[24..])
}

fn decode_reward_data(result: &str) -> Result<RewardData, RpcError> {
    let words = result_words(result)?;
    if words.len() < 5 {
        return Err(RpcError::Decode(format!(
            "reward_data returned {} words, expected 5",
            words.len()
        )));
    }
    Ok(RewardData {
        distributor: word_to_address(words[0]),
        period_finish: word_to_u64(words[1])?,
        rate: word_to_u128(words[2])?,
        last_update: word_to_u64(words[3])?,
        integral: word_to_u128(words[4])?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_uint_pads_to_word() {
        assert_eq!(
            encode_uint(3),
            "0000000000000000000000000000000000000000000000000000000000000003"
        );
        assert_eq!(encode_uint(0).len(), 64);
    }

    #[test]
    fn test_encode_address_left_pads_and_lowercases() {
        let encoded = encode_address("0x11CDb42B0EB46D95f990BeDD4695A6e3fA034978").unwrap();
        assert_eq!(
            encoded,
            "00000000000000000000000011cdb42b0eb46d95f990bedd4695a6e3fa034978"
        );
    }

    #[test]
    fn test_encode_address_rejects_garbage() {
        assert!(encode_address("11cdb42b0eb46d95f990bedd4695a6e3fa034978").is_err());
        assert!(encode_address("0x11cd").is_err());
        assert!(encode_address("0xzzcdb42b0eb46d95f990bedd4695a6e3fa034978").is_err());
    }

    #[test]
    fn test_word_to_u64() {
        let word = "00000000000000000000000000000000000000000000000000000000660c8e80";
        assert_eq!(word_to_u64(word).unwrap(), 0x660c8e80);
    }

    #[test]
    fn test_word_to_u64_rejects_overflow() {
        let word = "0000000000000000000000000000000000000000000000010000000000000000";
        assert!(word_to_u64(word).is_err());
    }

    #[test]
    fn test_word_to_address_takes_low_20_bytes() {
        let word = "00000000000000000000000011cdb42b0eb46d95f990bedd4695a6e3fa034978";
        assert_eq!(
            word_to_address(word),
            "0x11cdb42b0eb46d95f990bedd4695a6e3fa034978"
        );
    }

    #[test]
    fn test_result_words_rejects_ragged_length() {
        assert!(result_words("0x1234").is_err());
        assert!(result_words("0x").is_err());
    }

    #[test]
    fn test_decode_reward_data_extracts_period_finish() {
        let result = format!(
            "0x{}{}{}{}{}",
            "000000000000000000000000989aeb4d175e16225e39e87d0d97a3360524ad80",
            "0000000000000000000000000000000000000000000000000000000066a1f380",
            "00000000000000000000000000000000000000000000000000005af3107a4000",
            "0000000000000000000000000000000000000000000000000000000066a1a200",
            "0000000000000000000000000000000000000000000000000de0b6b3a7640000",
        );
        let data = decode_reward_data(&result).unwrap();
        assert_eq!(data.distributor, "0x989aeb4d175e16225e39e87d0d97a3360524ad80");
        assert_eq!(data.period_finish, 0x66a1f380);
        assert_eq!(data.rate, 0x5af3107a4000);
        assert_eq!(data.last_update, 0x66a1a200);
        assert_eq!(data.integral, 0xde0b6b3a7640000);
    }

    #[test]
    fn test_decode_reward_data_rejects_short_return() {
        let result = "0x0000000000000000000000000000000000000000000000000000000066a1f380";
        assert!(decode_reward_data(result).is_err());
    }

    #[test]
    fn test_hours_remaining_future() {
        let now = 1_700_000_000_i64;
        let finish = (now + 10 * 3600) as u64;
        let hours = hours_remaining(finish, now);
        assert!((hours - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_hours_remaining_past_is_negative() {
        let now = 1_700_000_000_i64;
        let finish = (now - 5400) as u64;
        let hours = hours_remaining(finish, now);
        assert!((hours + 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_hours_remaining_fractional() {
        let now = 1_700_000_000_i64;
        let finish = (now + 1800) as u64;
        assert!((hours_remaining(finish, now) - 0.5).abs() < f64::EPSILON);
    }
}
