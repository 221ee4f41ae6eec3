use std::{fmt, sync::Arc};

use geo::Geometry;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Feature properties: string keys to arbitrary JSON values.
pub type Properties = Map<String, Value>;

/// The optional `id` member of a feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureId {
    UInt(u64),
    Int(i64),
    Float(f64),
    String(String),
}

impl FeatureId {
    /// Read an id from a JSON value; only numbers and strings are ids.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_u64().map(Self::UInt)
                .or_else(|| n.as_i64().map(Self::Int))
                .or_else(|| n.as_f64().map(Self::Float)),
            Value::String(s) => Some(Self::String(s.clone())),
            _ => None,
        }
    }

    /// Convert back to a JSON value.
    pub fn to_json(&self) -> Value {
        match self {
            Self::UInt(v) => Value::from(*v),
            Self::Int(v) => Value::from(*v),
            Self::Float(v) => Value::from(*v),
            Self::String(s) => Value::from(s.as_str()),
        }
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UInt(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::String(s) => f.write_str(s),
        }
    }
}

impl From<u64> for FeatureId {
    fn from(v: u64) -> Self { Self::UInt(v) }
}

impl From<&str> for FeatureId {
    fn from(s: &str) -> Self { Self::String(s.to_owned()) }
}

impl From<String> for FeatureId {
    fn from(s: String) -> Self { Self::String(s) }
}

/// An input feature in longitude/latitude degrees.
///
/// Properties sit behind an `Arc` because every tile a feature lands in
/// shares them.  A feature with no geometry is accepted and ignored by both
/// indexes.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub geometry: Option<Geometry<f64>>,
    pub properties: Arc<Properties>,
    pub id: Option<FeatureId>,
}

impl Feature {
    /// A feature with the given geometry, no properties and no id.
    pub fn new(geometry: impl Into<Geometry<f64>>) -> Self {
        Self { geometry: Some(geometry.into()), properties: Arc::default(), id: None }
    }

    /// Replace the properties.
    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = Arc::new(properties);
        self
    }

    /// Replace the id.
    pub fn with_id(mut self, id: impl Into<FeatureId>) -> Self {
        self.id = Some(id.into());
        self
    }
}
