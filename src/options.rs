//! Compression settings sent under the `scaledown` key of a request.

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, ScaleDownError};

/// How aggressively the service shortens the prompt.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum Rate {
    /// Service picks the rate (`"auto"`)
    #[default]
    Auto,
    /// Explicit target ratio, e.g. `0.5`
    Ratio(f64),
}

impl Rate {
    /// Explicit ratio; must be finite.
    pub fn ratio(value: f64) -> Result<Self> {
        Rate::Ratio(value).validated()
    }

    fn validated(self) -> Result<Self> {
        match self {
            Rate::Ratio(r) if !r.is_finite() => Err(ScaleDownError::InvalidInput(format!(
                "rate must be a finite number, got {r}"
            ))),
            rate => Ok(rate),
        }
    }

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::String(s) if s.eq_ignore_ascii_case("auto") => Ok(Rate::Auto),
            Value::Number(n) => Rate::ratio(n.as_f64().unwrap_or(f64::NAN)),
            other => Err(ScaleDownError::InvalidInput(format!(
                "rate must be \"auto\" or a number, got {other}"
            ))),
        }
    }
}

impl Serialize for Rate {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Rate::Auto => serializer.serialize_str("auto"),
            Rate::Ratio(r) => serializer.serialize_f64(*r),
        }
    }
}

impl<'de> Deserialize<'de> for Rate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Rate::from_value(&value).map_err(de::Error::custom)
    }
}

/// Options merged shallowly over the defaults `rate = "auto"`, `preserve_keywords = false`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScaleDownOptions {
    /// Compression rate
    #[serde(default)]
    pub rate: Rate,

    /// Ask the service to keep keywords verbatim
    #[serde(default)]
    pub preserve_keywords: bool,

    /// Any other service-side setting, passed through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ScaleDownOptions {
    /// Defaults only
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the compression rate
    pub fn with_rate(mut self, rate: Rate) -> Self {
        self.rate = rate;
        self
    }

    /// Set keyword preservation
    pub fn with_preserve_keywords(mut self, preserve: bool) -> Self {
        self.preserve_keywords = preserve;
        self
    }

    /// Apply one caller override. Known keys are type-checked, anything else
    /// is forwarded as-is.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Result<Self> {
        let key = key.into();
        let value = value.into();
        match key.as_str() {
            "rate" => self.rate = Rate::from_value(&value)?,
            "preserve_keywords" => {
                self.preserve_keywords = value.as_bool().ok_or_else(|| {
                    ScaleDownError::InvalidInput(format!(
                        "preserve_keywords must be a boolean, got {value}"
                    ))
                })?;
            },
            _ => {
                self.extra.insert(key, value);
            },
        }
        Ok(self)
    }

    /// Apply every entry of an override map, in order.
    pub fn merge(self, overrides: Map<String, Value>) -> Result<Self> {
        overrides
            .into_iter()
            .try_fold(self, |options, (key, value)| options.set(key, value))
    }

    /// The `scaledown` object of the request body.
    pub fn to_value(&self) -> Result<Value> {
        self.rate.validated()?;
        Ok(serde_json::to_value(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_serialize() {
        let value = ScaleDownOptions::default().to_value().unwrap();
        assert_eq!(value, json!({"rate": "auto", "preserve_keywords": false}));
    }

    #[test]
    fn test_overrides_are_shallow() {
        let options = ScaleDownOptions::new()
            .set("rate", 0.4)
            .unwrap()
            .set("preserve_keywords", true)
            .unwrap()
            .set("target_tokens", 256)
            .unwrap();

        assert_eq!(options.rate, Rate::Ratio(0.4));
        assert!(options.preserve_keywords);
        assert_eq!(
            options.to_value().unwrap(),
            json!({"rate": 0.4, "preserve_keywords": true, "target_tokens": 256})
        );
    }

    #[test]
    fn test_rate_back_to_auto() {
        let options = ScaleDownOptions::new()
            .with_rate(Rate::Ratio(0.2))
            .set("rate", "auto")
            .unwrap();
        assert_eq!(options.rate, Rate::Auto);
    }

    #[test]
    fn test_invalid_overrides_rejected() {
        assert!(ScaleDownOptions::new().set("rate", "fast").is_err());
        assert!(ScaleDownOptions::new().set("preserve_keywords", "yes").is_err());
    }

    #[test]
    fn test_non_finite_rate_rejected() {
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = ScaleDownOptions::new()
                .with_rate(Rate::Ratio(bad))
                .to_value()
                .unwrap_err();
            assert!(matches!(err, ScaleDownError::InvalidInput(_)));
            assert!(Rate::ratio(bad).is_err());
        }
        assert_eq!(Rate::ratio(0.3).unwrap(), Rate::Ratio(0.3));
    }

    #[test]
    fn test_merge_map() {
        let overrides = json!({"preserve_keywords": true, "mode": "aggressive"});
        let options = ScaleDownOptions::new()
            .merge(overrides.as_object().unwrap().clone())
            .unwrap();
        assert!(options.preserve_keywords);
        assert_eq!(options.extra.get("mode"), Some(&json!("aggressive")));
    }

    #[test]
    fn test_deserialize_from_toml_like_value() {
        let options: ScaleDownOptions =
            serde_json::from_value(json!({"rate": 0.5, "language": "en"})).unwrap();
        assert_eq!(options.rate, Rate::Ratio(0.5));
        assert!(!options.preserve_keywords);
        assert_eq!(options.extra.get("language"), Some(&json!("en")));
    }
}
