//! # JSON Conversion
//!
//! Converts contexts to and from `serde_json::Value` so callers (and the CLI)
//! can feed inputs and inspect outputs as JSON.
//!
//! | JSON | Datum |
//! |------|-------|
//! | null, bool, number, string | `Scalar` |
//! | object | `Map` |
//! | array | `Seq` |
//!
//! Integers that fit in `i64` become `Value::Int`, every other number becomes
//! `Value::Float`. Blobs have no JSON form and are rendered as `\x`-prefixed
//! hex strings on the way out; they do not round-trip.

use eyre::{bail, Result};
use serde_json::{Map, Number, Value as Json};

use super::{Context, Datum, Value};

impl Context {
    /// Builds a context from a JSON object.
    pub fn from_json(json: &Json) -> Result<Self> {
        match json {
            Json::Object(map) => Ok(object_to_context(map)),
            other => bail!("context must be a JSON object, got {}", kind_name(other)),
        }
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let json: Json = serde_json::from_str(text)?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Json {
        Json::Object(
            self.iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect::<Map<String, Json>>(),
        )
    }
}

impl Datum {
    pub fn from_json(json: &Json) -> Self {
        match json {
            Json::Object(map) => Datum::Map(object_to_context(map)),
            Json::Array(items) => Datum::Seq(items.iter().map(Datum::from_json).collect()),
            scalar => Datum::Scalar(Value::from_json(scalar)),
        }
    }

    pub fn to_json(&self) -> Json {
        match self {
            Datum::Scalar(v) => v.to_json(),
            Datum::Map(m) => m.to_json(),
            Datum::Seq(items) => Json::Array(items.iter().map(Datum::to_json).collect()),
        }
    }
}

impl Value {
    /// Converts a JSON scalar. Arrays and objects are stored as their JSON text.
    pub fn from_json(json: &Json) -> Self {
        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(*b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Json::String(s) => Value::Text(s.clone()),
            nested => Value::Text(nested.to_string()),
        }
    }

    pub fn to_json(&self) -> Json {
        match self {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Int(i) => Json::Number((*i).into()),
            Value::Float(f) => Number::from_f64(*f).map(Json::Number).unwrap_or(Json::Null),
            Value::Text(s) => Json::String(s.clone()),
            Value::Blob(b) => {
                let hex: String = b.iter().map(|byte| format!("{:02x}", byte)).collect();
                Json::String(format!("\\x{}", hex))
            }
        }
    }
}

fn object_to_context(map: &Map<String, Json>) -> Context {
    map.iter()
        .map(|(k, v)| (k.clone(), Datum::from_json(v)))
        .collect()
}

fn kind_name(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "a boolean",
        Json::Number(_) => "a number",
        Json::String(_) => "a string",
        Json::Array(_) => "an array",
        Json::Object(_) => "an object",
    }
}
