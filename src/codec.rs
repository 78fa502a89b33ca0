//! Decoding of composite values embedded in URL path and query segments.
//!
//! Object references travel inside URLs in their serialized composite
//! form: non-exploded as `ptr,0xABC`, exploded as `ptr=0xABC`. The codec
//! reassembles those (and plain arrays/scalars) ahead of dispatch,
//! tolerating schema composition declarations that hide the object type
//! behind a union/intersection.
//!
//! Declared-type coercion is deliberately lenient: a value that fails to
//! coerce passes through unchanged as an explicit
//! [`CoercionSkipped`] branch, deferring final validation to a later
//! stage.

use serde_json::{Map, Value};

/// Serialization style of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterStyle {
    Form,
    Simple,
}

/// Where the parameter appears in the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterLocation {
    Path,
    Query,
}

impl ParameterLocation {
    /// The default style for this location.
    const fn default_style(self) -> ParameterStyle {
        match self {
            ParameterLocation::Path => ParameterStyle::Simple,
            ParameterLocation::Query => ParameterStyle::Form,
        }
    }
}

/// Scalar kind a decoded string is coerced to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoercionKind {
    String,
    Integer,
    Number,
    Boolean,
}

/// Shape class of the parameter's declared schema.
///
/// `Composite` covers object types, schema references, and
/// union/intersection compositions; all of them decode the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaShape {
    Composite,
    Array(CoercionKind),
    Scalar(CoercionKind),
}

/// One declared parameter, as the codec needs to see it.
#[derive(Debug, Clone)]
pub struct ParameterSpec {
    pub name: String,
    pub location: ParameterLocation,
    pub style: Option<ParameterStyle>,
    pub explode: Option<bool>,
    pub shape: SchemaShape,
}

impl ParameterSpec {
    pub fn path(name: impl Into<String>, shape: SchemaShape) -> Self {
        Self {
            name: name.into(),
            location: ParameterLocation::Path,
            style: None,
            explode: None,
            shape,
        }
    }

    pub fn query(name: impl Into<String>, shape: SchemaShape) -> Self {
        Self {
            name: name.into(),
            location: ParameterLocation::Query,
            style: None,
            explode: None,
            shape,
        }
    }

    pub fn with_style(mut self, style: ParameterStyle) -> Self {
        self.style = Some(style);
        self
    }

    pub fn with_explode(mut self, explode: bool) -> Self {
        self.explode = Some(explode);
        self
    }

    /// Effective style: declared, or the location default.
    pub fn style(&self) -> ParameterStyle {
        self.style.unwrap_or(self.location.default_style())
    }

    /// Effective explode flag: declared, or exploded iff the style is
    /// `form`.
    pub fn explode(&self) -> bool {
        self.explode
            .unwrap_or(self.style() == ParameterStyle::Form)
    }
}

/// Marker for a declined coercion; the decoded value passes through as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoercionSkipped;

/// Decode one parameter from its raw occurrences.
///
/// `values` holds every supplied occurrence in order; path parameters
/// always have exactly one.
pub fn decode(spec: &ParameterSpec, values: &[String]) -> Value {
    let Some(raw) = values.last() else {
        return Value::Null;
    };

    match spec.shape {
        SchemaShape::Composite => {
            if spec.explode() {
                // Exploded composites arrive as discrete key/value pairs
                // upstream of this layer; nothing to reassemble here.
                Value::String(raw.clone())
            } else {
                decode_composite_pairs(raw)
            }
        }
        SchemaShape::Array(kind) => {
            let items: Vec<&str> = if spec.explode() {
                values.iter().map(String::as_str).collect()
            } else {
                raw.split(',').collect()
            };
            Value::Array(
                items
                    .into_iter()
                    .map(|item| coerce_or_keep(kind, Value::String(item.to_string())))
                    .collect(),
            )
        }
        // Scalars follow "last wins" for repeated occurrences.
        SchemaShape::Scalar(kind) => coerce_or_keep(kind, Value::String(raw.clone())),
    }
}

/// Reassemble `k1,v1,k2,v2,...` into a key/value mapping.
///
/// An odd-length or unsplit string is returned unmodified; that fallback
/// keeps raw pointer strings usable when they do not follow the pair
/// convention.
fn decode_composite_pairs(raw: &str) -> Value {
    if raw.contains(',') {
        let parts: Vec<&str> = raw.split(',').collect();
        if parts.len() >= 2 && parts.len() % 2 == 0 {
            let mut object = Map::new();
            for pair in parts.chunks(2) {
                object.insert(pair[0].to_string(), Value::String(pair[1].to_string()));
            }
            return Value::Object(object);
        }
    }
    Value::String(raw.to_string())
}

/// Attempt declared-type coercion of a decoded value.
///
/// Only strings are coerced; anything already typed is returned as-is. A
/// string that does not parse as the declared kind yields
/// [`CoercionSkipped`].
pub fn coerce(kind: CoercionKind, value: &Value) -> Result<Value, CoercionSkipped> {
    let Value::String(text) = value else {
        return Ok(value.clone());
    };
    match kind {
        CoercionKind::String => Ok(value.clone()),
        CoercionKind::Integer => text
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| CoercionSkipped),
        CoercionKind::Number => text
            .parse::<f64>()
            .map(Value::from)
            .map_err(|_| CoercionSkipped),
        CoercionKind::Boolean => match text.as_str() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(CoercionSkipped),
        },
    }
}

fn coerce_or_keep(kind: CoercionKind, value: Value) -> Value {
    match coerce(kind, &value) {
        Ok(coerced) => coerced,
        // Deliberate leniency: the un-coerced value flows on to later
        // validation.
        Err(CoercionSkipped) => value,
    }
}

/// Serialize a composite object for URL embedding.
///
/// Non-exploded: `k1,v1,k2,v2,...`; exploded: `k1=v1&k2=v2`.
pub fn encode_composite(object: &Map<String, Value>, explode: bool) -> String {
    let render = |value: &Value| match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    if explode {
        object
            .iter()
            .map(|(k, v)| format!("{k}={}", render(v)))
            .collect::<Vec<_>>()
            .join("&")
    } else {
        object
            .iter()
            .flat_map(|(k, v)| [k.clone(), render(v)])
            .collect::<Vec<_>>()
            .join(",")
    }
}
