//! # Canonical Serializer
//!
//! Turns payload objects into the exact bytes that get signed and sent:
//! XML without a declaration, no indentation, elements in declaration order.
//!
//! Two date-time layouts coexist on the wire, `yyyy-MM-ddTHH:mm:ss` with and
//! without a literal `Z`. Each field picks its layout through
//! `#[serde(with = "...")]`, so two fields of the same message can differ.

use super::errors::CanonicalError;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// A business document that can travel inside an envelope.
pub trait Payload: Serialize {
    /// Element name of the document on the wire, e.g. `gepgBillSubReq`.
    const ROOT: &'static str;
}

/// Serialize a payload to its canonical bytes.
pub fn canonicalize<P: Payload>(payload: &P) -> Result<Vec<u8>, CanonicalError> {
    let xml = quick_xml::se::to_string_with_root(P::ROOT, payload)
        .map_err(|e| CanonicalError::Encode(e.to_string()))?;
    Ok(xml.into_bytes())
}

/// Map verified payload bytes back to a typed document.
///
/// The root element must be `P::ROOT`; a different document is a decode
/// failure even if its fields would happen to fit.
pub fn decode<P: Payload + DeserializeOwned>(bytes: &[u8]) -> Result<P, CanonicalError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| CanonicalError::Decode(format!("payload is not UTF-8: {e}")))?;

    match root_element(bytes)? {
        Some(root) if root == P::ROOT => {}
        Some(root) => {
            return Err(CanonicalError::Decode(format!(
                "expected <{}>, found <{root}>",
                P::ROOT
            )))
        }
        None => return Err(CanonicalError::Decode("payload has no element".to_string())),
    }

    quick_xml::de::from_str(text).map_err(|e| CanonicalError::Decode(e.to_string()))
}

/// Name of the first element in `bytes`, if any.
pub fn root_element(bytes: &[u8]) -> Result<Option<String>, CanonicalError> {
    let mut reader = Reader::from_reader(bytes);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                return Ok(Some(String::from_utf8_lossy(e.name().as_ref()).into_owned()))
            }
            Ok(Event::Eof) => return Ok(None),
            Ok(_) => continue,
            Err(e) => return Err(CanonicalError::Decode(e.to_string())),
        }
    }
}

/// `yyyy-MM-ddTHH:mm:ssZ`
pub mod zulu_datetime {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let text = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(text.trim(), FORMAT).map_err(serde::de::Error::custom)
    }
}

/// `yyyy-MM-ddTHH:mm:ss`
pub mod local_datetime {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let text = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(text.trim(), FORMAT).map_err(serde::de::Error::custom)
    }
}

/// `yyyy-MM-dd`
pub mod calendar_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S: Serializer>(value: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let text = String::deserialize(deserializer)?;
        NaiveDate::parse_from_str(text.trim(), FORMAT).map_err(serde::de::Error::custom)
    }
}

/// Monetary amounts: plain digits, two decimal places, no grouping.
///
/// Sub-cent precision is an encode error. Rounding would sign an amount the
/// caller never asked for.
pub mod amount {
    use rust_decimal::Decimal;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::str::FromStr;

    /// `None` when `value` carries significant digits past the cent.
    pub fn format(value: &Decimal) -> Option<String> {
        (value.normalize().scale() <= 2).then(|| format!("{value:.2}"))
    }

    pub fn serialize<S: Serializer>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
        let text = format(value).ok_or_else(|| {
            <S::Error as serde::ser::Error>::custom(format!(
                "amount {value} has more than two decimal places"
            ))
        })?;
        serializer.serialize_str(&text)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
        let text = String::deserialize(deserializer)?;
        Decimal::from_str(text.trim()).map_err(serde::de::Error::custom)
    }
}
