//! Spy configuration
//!
//! Recognised options:
//! - `top` - pixels subtracted from each section's top edge (default 0)
//! - `bottom` - pixels trimmed from each section's bottom edge (default 10)
//! - `bottomOut` - activate the last target once the page cannot scroll any
//!   further (default true)
//!
//! # Example
//!
//! ```
//! use navspy::SpyOptions;
//!
//! let options = SpyOptions::from_json_str(r#"{ "top": 64, "bottomOut": false }"#).unwrap();
//! assert_eq!(options.top, 64);
//! assert_eq!(options.bottom, 10);
//! assert!(!options.bottom_out);
//! ```

use serde::Serialize;
use serde_json::{Map, Value};

use crate::bounds::Offsets;
use crate::error::ConfigError;

pub const DEFAULT_TOP_OFFSET: u32 = 0;
pub const DEFAULT_BOTTOM_OFFSET: u32 = 10;

/// Validated spy options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpyOptions {
    pub top: u32,
    pub bottom: u32,
    pub bottom_out: bool,
}

impl Default for SpyOptions {
    fn default() -> Self {
        Self {
            top: DEFAULT_TOP_OFFSET,
            bottom: DEFAULT_BOTTOM_OFFSET,
            bottom_out: true,
        }
    }
}

impl SpyOptions {
    /// Build options from signed offsets, rejecting negative values.
    pub fn new(top: i64, bottom: i64, bottom_out: bool) -> Result<Self, ConfigError> {
        Ok(Self {
            top: offset_from_int("top", top)?,
            bottom: offset_from_int("bottom", bottom)?,
            bottom_out,
        })
    }

    pub fn with_top(mut self, top: u32) -> Self {
        self.top = top;
        self
    }

    pub fn with_bottom(mut self, bottom: u32) -> Self {
        self.bottom = bottom;
        self
    }

    pub fn with_bottom_out(mut self, bottom_out: bool) -> Self {
        self.bottom_out = bottom_out;
        self
    }

    /// Offsets handed to the bounds calculator.
    pub fn offsets(&self) -> Offsets {
        Offsets {
            top: self.top,
            bottom: self.bottom,
        }
    }

    /// Parse options from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_json_value(&value)
    }

    /// Validate an untyped options object.
    ///
    /// Missing keys keep their defaults and `null` is treated as "no options".
    /// Unknown keys are ignored with a warning.
    pub fn from_json_value(value: &Value) -> Result<Self, ConfigError> {
        let map = match value {
            Value::Null => return Ok(Self::default()),
            Value::Object(map) => map,
            other => return Err(ConfigError::NotAnObject(describe(other))),
        };

        let mut options = Self::default();
        for (key, value) in map {
            match key.as_str() {
                "top" => options.top = offset_from_value("top", value)?,
                "bottom" => options.bottom = offset_from_value("bottom", value)?,
                "bottomOut" | "bottom_out" => {
                    options.bottom_out = flag_from_value("bottomOut", value)?
                }
                unknown => tracing::warn!(option = unknown, "ignoring unknown spy option"),
            }
        }
        Ok(options)
    }

    /// Options as a JSON object, using the same keys `from_json_value` reads.
    pub fn to_json_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("top".into(), Value::from(self.top));
        map.insert("bottom".into(), Value::from(self.bottom));
        map.insert("bottomOut".into(), Value::from(self.bottom_out));
        Value::Object(map)
    }
}

// =============================================================================
// VALIDATION
// =============================================================================

fn offset_from_int(option: &'static str, value: i64) -> Result<u32, ConfigError> {
    if value < 0 {
        return Err(ConfigError::Negative {
            option,
            value: value as f64,
        });
    }
    u32::try_from(value).map_err(|_| ConfigError::OutOfRange {
        option,
        value: value as f64,
    })
}

fn offset_from_value(option: &'static str, value: &Value) -> Result<u32, ConfigError> {
    let Some(number) = value.as_f64() else {
        return Err(ConfigError::NotANumber {
            option,
            found: describe(value),
        });
    };
    if number < 0.0 {
        return Err(ConfigError::Negative {
            option,
            value: number,
        });
    }
    if number.fract() != 0.0 {
        return Err(ConfigError::NotAnInteger {
            option,
            value: number,
        });
    }
    if number > u32::MAX as f64 {
        return Err(ConfigError::OutOfRange {
            option,
            value: number,
        });
    }
    Ok(number as u32)
}

fn flag_from_value(option: &'static str, value: &Value) -> Result<bool, ConfigError> {
    value.as_bool().ok_or_else(|| ConfigError::NotABoolean {
        option,
        found: describe(value),
    })
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("boolean {b}"),
        Value::Number(n) => format!("number {n}"),
        Value::String(s) => format!("string {s:?}"),
        Value::Array(_) => "array".to_string(),
        Value::Object(_) => "object".to_string(),
    }
}
