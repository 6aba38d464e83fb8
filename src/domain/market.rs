//! Market catalog records and vendor-format token extraction.

use serde::Deserialize;
use serde_json::Value;

use crate::domain::ids::{MarketId, TokenId};

/// Which side of a binary market a token represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Polarity {
    Yes,
    No,
}

/// A binary-outcome market as returned by the catalog provider, reduced to
/// the fields the arbitrage core needs.
#[derive(Debug, Clone)]
pub struct MarketRecord {
    pub market_id: MarketId,
    pub question: String,
    pub yes_token: TokenId,
    pub no_token: TokenId,
}

impl MarketRecord {
    pub fn token_for(&self, polarity: Polarity) -> &TokenId {
        match polarity {
            Polarity::Yes => &self.yes_token,
            Polarity::No => &self.no_token,
        }
    }

    /// The other leg of the pair, given one of its tokens.
    pub fn sibling_of(&self, token_id: &TokenId) -> Option<&TokenId> {
        if *token_id == self.yes_token {
            Some(&self.no_token)
        } else if *token_id == self.no_token {
            Some(&self.yes_token)
        } else {
            None
        }
    }
}

/// Raw catalog market payload, deserialized loosely because the provider
/// emits two incompatible token encodings depending on API vintage.
#[derive(Debug, Clone, Deserialize)]
pub struct RawMarket {
    pub condition_id: String,
    pub question: Option<String>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub closed: bool,
    #[serde(default)]
    pub clob_token_ids: Option<Value>,
    #[serde(default)]
    pub outcomes: Option<Value>,
    #[serde(default)]
    pub tokens: Vec<RawToken>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawToken {
    pub token_id: String,
    pub outcome: String,
}

/// Extracts (yes, no) token ids from a raw market payload.
///
/// Markets ship in one of two vendor encodings: a paired list of
/// `clob_token_ids` matched positionally against an `outcomes` list (each of
/// which may itself be JSON-encoded as a string), or a legacy `tokens` array
/// where each entry carries its own outcome label. The paired-list encoding
/// is tried first; if it is absent or doesn't resolve both legs, the legacy
/// array is tried. Returns `None` if neither encoding yields a complete pair.
pub fn extract_token_ids(market: &RawMarket) -> Option<(TokenId, TokenId)> {
    if let Some(pair) = extract_from_paired_list(market) {
        return Some(pair);
    }
    extract_from_legacy_tokens(market)
}

fn extract_from_paired_list(market: &RawMarket) -> Option<(TokenId, TokenId)> {
    let clob_ids = decode_string_list(market.clob_token_ids.as_ref()?)?;
    if clob_ids.is_empty() {
        return None;
    }
    let outcomes = market
        .outcomes
        .as_ref()
        .and_then(decode_string_list)
        .unwrap_or_else(|| vec!["Yes".to_string(), "No".to_string()]);

    let mut yes = None;
    let mut no = None;
    for (outcome, token_id) in outcomes.iter().zip(clob_ids.iter()) {
        match outcome.to_lowercase().as_str() {
            "yes" => yes = Some(TokenId::from(token_id.clone())),
            "no" => no = Some(TokenId::from(token_id.clone())),
            _ => {}
        }
    }

    match (yes, no) {
        (Some(y), Some(n)) => Some((y, n)),
        _ => None,
    }
}

fn extract_from_legacy_tokens(market: &RawMarket) -> Option<(TokenId, TokenId)> {
    let yes = market
        .tokens
        .iter()
        .find(|t| t.outcome.to_lowercase() == "yes")?;
    let no = market
        .tokens
        .iter()
        .find(|t| t.outcome.to_lowercase() == "no")?;
    Some((
        TokenId::from(yes.token_id.clone()),
        TokenId::from(no.token_id.clone()),
    ))
}

/// Accepts a JSON array, or a string containing a JSON-encoded array, and
/// returns the flattened list of strings. Non-string elements are dropped.
fn decode_string_list(value: &Value) -> Option<Vec<String>> {
    let array = match value {
        Value::Array(items) => items.clone(),
        Value::String(s) => serde_json::from_str::<Value>(s).ok()?.as_array()?.clone(),
        _ => return None,
    };
    Some(
        array
            .into_iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
    )
}

/// Builds a [`MarketRecord`] from a raw catalog payload, skipping markets
/// that aren't binary or whose token ids can't be resolved.
pub fn build_record(market: &RawMarket) -> Option<MarketRecord> {
    let (yes_token, no_token) = extract_token_ids(market)?;
    Some(MarketRecord {
        market_id: MarketId::from(market.condition_id.clone()),
        question: market.question.clone().unwrap_or_default(),
        yes_token,
        no_token,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paired_market(yes_id: &str, no_id: &str) -> RawMarket {
        RawMarket {
            condition_id: "cond-1".to_string(),
            question: Some("Will it happen?".to_string()),
            active: true,
            closed: false,
            clob_token_ids: Some(Value::Array(vec![
                Value::String(yes_id.to_string()),
                Value::String(no_id.to_string()),
            ])),
            outcomes: Some(Value::Array(vec![
                Value::String("Yes".to_string()),
                Value::String("No".to_string()),
            ])),
            tokens: vec![],
        }
    }

    #[test]
    fn extracts_from_paired_list() {
        let market = paired_market("yes-1", "no-1");
        let (yes, no) = extract_token_ids(&market).unwrap();
        assert_eq!(yes.as_str(), "yes-1");
        assert_eq!(no.as_str(), "no-1");
    }

    #[test]
    fn extracts_from_paired_list_when_outcomes_are_json_strings() {
        let mut market = paired_market("yes-1", "no-1");
        market.clob_token_ids = Some(Value::String(r#"["yes-1","no-1"]"#.to_string()));
        market.outcomes = Some(Value::String(r#"["Yes","No"]"#.to_string()));
        let (yes, no) = extract_token_ids(&market).unwrap();
        assert_eq!(yes.as_str(), "yes-1");
        assert_eq!(no.as_str(), "no-1");
    }

    #[test]
    fn falls_back_to_legacy_tokens_array() {
        let market = RawMarket {
            condition_id: "cond-2".to_string(),
            question: None,
            active: true,
            closed: false,
            clob_token_ids: None,
            outcomes: None,
            tokens: vec![
                RawToken {
                    token_id: "yes-2".to_string(),
                    outcome: "Yes".to_string(),
                },
                RawToken {
                    token_id: "no-2".to_string(),
                    outcome: "No".to_string(),
                },
            ],
        };
        let (yes, no) = extract_token_ids(&market).unwrap();
        assert_eq!(yes.as_str(), "yes-2");
        assert_eq!(no.as_str(), "no-2");
    }

    #[test]
    fn returns_none_when_neither_format_resolves() {
        let market = RawMarket {
            condition_id: "cond-3".to_string(),
            question: None,
            active: true,
            closed: false,
            clob_token_ids: None,
            outcomes: None,
            tokens: vec![],
        };
        assert!(extract_token_ids(&market).is_none());
    }

    #[test]
    fn sibling_of_resolves_either_leg() {
        let record = MarketRecord {
            market_id: MarketId::from("cond-1"),
            question: "Q?".to_string(),
            yes_token: TokenId::from("yes-1"),
            no_token: TokenId::from("no-1"),
        };
        assert_eq!(
            record.sibling_of(&TokenId::from("yes-1")).unwrap().as_str(),
            "no-1"
        );
        assert_eq!(
            record.sibling_of(&TokenId::from("no-1")).unwrap().as_str(),
            "yes-1"
        );
        assert!(record.sibling_of(&TokenId::from("unknown")).is_none());
    }
}
