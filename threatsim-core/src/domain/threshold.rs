use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// An alert threshold labelling one scenario of the sequence.
///
/// The first entry of the reference list is `∞` (alerts disabled), so the
/// value may be infinite. JSON has no infinity, so infinite values serialize
/// as the strings `"inf"` / `"-inf"`; finite values serialize as numbers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertThreshold(pub f64);

impl AlertThreshold {
    pub const DISABLED: AlertThreshold = AlertThreshold(f64::INFINITY);

    pub fn value(self) -> f64 {
        self.0
    }

    /// Axis label: `∞` for the disabled threshold, otherwise the value with at
    /// least one decimal (`3.0`, `2.9`).
    pub fn label(self) -> String {
        if self.0.is_infinite() {
            if self.0 > 0.0 { "∞".into() } else { "-∞".into() }
        } else {
            format!("{:?}", self.0)
        }
    }
}

impl From<f64> for AlertThreshold {
    fn from(v: f64) -> Self {
        Self(v)
    }
}

impl fmt::Display for AlertThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl Serialize for AlertThreshold {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0.is_infinite() {
            serializer.serialize_str(if self.0 > 0.0 { "inf" } else { "-inf" })
        } else {
            serializer.serialize_f64(self.0)
        }
    }
}

impl<'de> Deserialize<'de> for AlertThreshold {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(f64),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Number(v) => Ok(Self(v)),
            Repr::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "inf" | "+inf" | "infinity" | "∞" => Ok(Self(f64::INFINITY)),
                "-inf" | "-infinity" | "-∞" => Ok(Self(f64::NEG_INFINITY)),
                other => other
                    .parse::<f64>()
                    .map(Self)
                    .map_err(|_| serde::de::Error::custom(format!("invalid threshold '{s}'"))),
            },
        }
    }
}
