//! Status payload normalization.
//!
//! Firmware revisions answer the status query in one of two encodings:
//!
//! - **Structured**: a JSON object whose `C.ch` holds the four channel values
//!   (as numbers, or as numeric strings on some firmware).
//! - **Flat string**: the `statusvars.js` script, `key=value;key=value;...`
//!   with one `brightness=[w,b,g,r]` entry. It may also arrive wrapped in a
//!   JSON string literal.
//!
//! [`StatusPayload::classify`] picks the variant; [`StatusPayload::channels`]
//! turns it into a [`Channels`] reading. Nothing here defaults to zero: a
//! payload that cannot be read is a [`ParseError`].

use std::fmt;

use serde_json::Value;

use crate::protocol::CHANNEL_COUNT;
use crate::state::{CHANNEL_MAX, Channels};

/// Key of the channel tuple in the flat encoding.
const BRIGHTNESS_KEY: &str = "brightness";

/// Longest excerpt of an unreadable payload kept in errors and logs.
const EXCERPT_LEN: usize = 64;

/// Why a status payload could not be normalized.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// Neither the structured nor the flat encoding.
    UnrecognizedShape(String),
    /// The encoding was recognized but carried no channel values.
    MissingChannels,
    /// The channel array or tuple did not hold exactly four values.
    ChannelCount(usize),
    /// A channel value was not a finite number.
    InvalidValue(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::UnrecognizedShape(excerpt) => {
                write!(f, "Unrecognized status payload: {excerpt:?}")
            }
            ParseError::MissingChannels => write!(f, "Status payload has no channel values"),
            ParseError::ChannelCount(n) => {
                write!(f, "Expected {CHANNEL_COUNT} channel values, got {n}")
            }
            ParseError::InvalidValue(v) => write!(f, "Invalid channel value: {v:?}"),
        }
    }
}

impl std::error::Error for ParseError {}

pub type Result<T> = std::result::Result<T, ParseError>;

/// A classified status payload.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusPayload {
    /// JSON object; the `C.ch` array, if present.
    Structured(Option<Vec<Value>>),
    /// `key=value;...` text.
    FlatString(String),
}

fn excerpt(body: &str) -> String {
    body.chars().take(EXCERPT_LEN).collect()
}

fn is_flat(text: &str) -> bool {
    text.contains(';') && text.contains('=')
}

impl StatusPayload {
    /// Classify a raw status body.
    pub fn classify(body: &str) -> Result<Self> {
        let trimmed = body.trim();
        match serde_json::from_str::<Value>(trimmed) {
            Ok(Value::Object(map)) => {
                let ch = map
                    .get("C")
                    .and_then(|c| c.get("ch"))
                    .and_then(Value::as_array)
                    .cloned();
                Ok(StatusPayload::Structured(ch))
            }
            Ok(Value::String(text)) if is_flat(&text) => Ok(StatusPayload::FlatString(text)),
            Ok(_) => Err(ParseError::UnrecognizedShape(excerpt(trimmed))),
            Err(_) if is_flat(trimmed) => Ok(StatusPayload::FlatString(trimmed.to_string())),
            Err(_) => Err(ParseError::UnrecognizedShape(excerpt(trimmed))),
        }
    }

    /// Extract the four channels in wire order.
    pub fn channels(&self) -> Result<Channels> {
        match self {
            StatusPayload::Structured(None) => Err(ParseError::MissingChannels),
            StatusPayload::Structured(Some(values)) => {
                let parsed = values
                    .iter()
                    .map(json_channel)
                    .collect::<Result<Vec<u8>>>()?;
                to_channels(parsed)
            }
            StatusPayload::FlatString(text) => {
                let tuple = flat_brightness(text).ok_or(ParseError::MissingChannels)?;
                let inner = tuple
                    .trim()
                    .trim_start_matches('[')
                    .trim_end_matches(']')
                    .trim();
                if inner.is_empty() {
                    return Err(ParseError::ChannelCount(0));
                }
                let parsed = inner
                    .split(',')
                    .map(text_channel)
                    .collect::<Result<Vec<u8>>>()?;
                to_channels(parsed)
            }
        }
    }
}

/// Classify and normalize in one step.
pub fn normalize(body: &str) -> Result<Channels> {
    StatusPayload::classify(body)?.channels()
}

/// Find the value of the `brightness` entry in a flat payload.
fn flat_brightness(text: &str) -> Option<&str> {
    text.split(';').find_map(|entry| {
        let (key, value) = entry.split_once('=')?;
        (key.trim() == BRIGHTNESS_KEY).then_some(value)
    })
}

fn to_channels(values: Vec<u8>) -> Result<Channels> {
    let array: [u8; CHANNEL_COUNT] = values
        .as_slice()
        .try_into()
        .map_err(|_| ParseError::ChannelCount(values.len()))?;
    Ok(Channels::from_array(array))
}

fn clamp_channel(v: f64) -> Result<u8> {
    if !v.is_finite() {
        return Err(ParseError::InvalidValue(v.to_string()));
    }
    Ok(v.round().clamp(0.0, f64::from(CHANNEL_MAX)) as u8)
}

fn text_channel(raw: &str) -> Result<u8> {
    let cleaned = raw.trim().trim_matches(|c| c == '\'' || c == '"');
    let v: f64 = cleaned
        .parse()
        .map_err(|_| ParseError::InvalidValue(raw.trim().to_string()))?;
    clamp_channel(v)
}

fn json_channel(value: &Value) -> Result<u8> {
    match value {
        Value::Number(n) => {
            let v = n
                .as_f64()
                .ok_or_else(|| ParseError::InvalidValue(n.to_string()))?;
            clamp_channel(v)
        }
        Value::String(s) => text_channel(s),
        other => Err(ParseError::InvalidValue(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FLAT_ALL_OFF: &str = "lang=0;lamp='4Ch';profNum=0;profile='Profile 1';\
        tsimtime=0;tsimact=0;csimact=0;brightness=[0,0,0,0];times=[0,480,1200];";

    // ── classify ──

    #[test]
    fn classify_structured() {
        let payload = StatusPayload::classify(r#"{"C":{"no":4,"ch":[1,2,3,4]}}"#).unwrap();
        assert!(matches!(payload, StatusPayload::Structured(Some(ref v)) if v.len() == 4));
    }

    #[test]
    fn classify_flat_raw() {
        let payload = StatusPayload::classify(FLAT_ALL_OFF).unwrap();
        assert!(matches!(payload, StatusPayload::FlatString(_)));
    }

    #[test]
    fn classify_flat_wrapped_in_json_string() {
        let body = serde_json::to_string(FLAT_ALL_OFF).unwrap();
        let payload = StatusPayload::classify(&body).unwrap();
        assert_eq!(payload, StatusPayload::FlatString(FLAT_ALL_OFF.to_string()));
    }

    #[test]
    fn classify_rejects_plain_text() {
        let err = StatusPayload::classify("Method Not Allowed").unwrap_err();
        assert!(matches!(err, ParseError::UnrecognizedShape(_)));
    }

    #[test]
    fn classify_rejects_json_array() {
        let err = StatusPayload::classify("[10,20,30,40]").unwrap_err();
        assert!(matches!(err, ParseError::UnrecognizedShape(_)));
    }

    #[test]
    fn classify_rejects_json_string_without_assignments() {
        assert!(StatusPayload::classify(r#""hello""#).is_err());
    }

    // ── structured ──

    #[test]
    fn structured_maps_white_blue_green_red() {
        let ch = normalize(r#"{"C":{"ch":[10,20,30,40]}}"#).unwrap();
        assert_eq!(ch, Channels::new(10, 20, 30, 40));
        assert!(ch.is_on());
    }

    #[test]
    fn structured_accepts_numeric_strings() {
        let ch = normalize(r#"{"A":{"action":"01"},"C":{"no":4,"ch":["100","100","100","100"]}}"#)
            .unwrap();
        assert_eq!(ch, Channels::FULL);
    }

    #[test]
    fn structured_rounds_and_clamps() {
        let ch = normalize(r#"{"C":{"ch":[10.6,-5,250,99.4]}}"#).unwrap();
        assert_eq!(ch, Channels::new(11, 0, 100, 99));
    }

    #[test]
    fn structured_three_channels_is_error() {
        let err = normalize(r#"{"C":{"ch":[10,20,30]}}"#).unwrap_err();
        assert_eq!(err, ParseError::ChannelCount(3));
    }

    #[test]
    fn structured_five_channels_is_error() {
        let err = normalize(r#"{"C":{"ch":[1,2,3,4,5]}}"#).unwrap_err();
        assert_eq!(err, ParseError::ChannelCount(5));
    }

    #[test]
    fn structured_without_ch_is_missing() {
        let err = normalize(r#"{"S":{"cswi":false}}"#).unwrap_err();
        assert_eq!(err, ParseError::MissingChannels);
    }

    #[test]
    fn structured_non_numeric_value_is_error() {
        let err = normalize(r#"{"C":{"ch":[1,null,3,4]}}"#).unwrap_err();
        assert!(matches!(err, ParseError::InvalidValue(_)));
    }

    // ── flat string ──

    #[test]
    fn flat_all_zero_is_off() {
        let ch = normalize(FLAT_ALL_OFF).unwrap();
        assert_eq!(ch, Channels::OFF);
        assert!(!ch.is_on());
    }

    #[test]
    fn flat_maps_white_blue_green_red() {
        let ch = normalize("a=1;brightness=[5, 6, 7, 8];b=2").unwrap();
        assert_eq!(ch, Channels::new(5, 6, 7, 8));
    }

    #[test]
    fn flat_brightness_last_without_semicolon() {
        let ch = normalize("lang=0;brightness=[100,0,0,50]").unwrap();
        assert_eq!(ch, Channels::new(100, 0, 0, 50));
    }

    #[test]
    fn flat_ignores_keys_that_only_contain_brightness() {
        let ch = normalize("maxbrightness=[1,1,1,1];brightness=[2,2,2,2];").unwrap();
        assert_eq!(ch, Channels::new(2, 2, 2, 2));
    }

    #[test]
    fn flat_three_values_is_error() {
        let err = normalize("lang=0;brightness=[1,2,3];").unwrap_err();
        assert_eq!(err, ParseError::ChannelCount(3));
    }

    #[test]
    fn flat_empty_tuple_is_error() {
        let err = normalize("lang=0;brightness=[];").unwrap_err();
        assert_eq!(err, ParseError::ChannelCount(0));
    }

    #[test]
    fn flat_without_brightness_is_missing() {
        let err = normalize("lang=0;profNum=1;").unwrap_err();
        assert_eq!(err, ParseError::MissingChannels);
    }

    #[test]
    fn flat_garbage_value_is_error() {
        let err = normalize("brightness=[1,x,3,4];").unwrap_err();
        assert_eq!(err, ParseError::InvalidValue("x".into()));
    }

    #[test]
    fn unrecognized_excerpt_is_truncated() {
        let body = "x".repeat(500);
        match normalize(&body).unwrap_err() {
            ParseError::UnrecognizedShape(e) => assert_eq!(e.len(), EXCERPT_LEN),
            other => panic!("unexpected {other:?}"),
        }
    }
}
