//! Purpose: Per-kind rules for encoding values into document nodes and back.
//! Exports: `Codec`, `decode_as`, `infer_kind`.
//! Role: The only place that knows how each kind looks on disk.
//! Invariants: Scalars encode as decimal strings; compounds as objects of component strings.
//! Invariants: Decoding reads compound components by name, never by position, for objects.
//! Notes: `f32` uses Rust's shortest round-trip formatting, so finite values decode bit-exact.
//! Notes: NaN encodes as `NaN` and never compares equal, so reloading it always counts as a change.
use serde_json::{Map, Value};

use super::error::{Error, ErrorKind};
use super::kind::{Color, Kind, ParamValue, Quat, Vec2, Vec3, Vec4};

pub trait Codec: Sized {
    fn encode(&self) -> Value;
    fn decode(entry: &Value) -> Result<Self, Error>;
}

impl Codec for bool {
    fn encode(&self) -> Value {
        Value::String(self.to_string())
    }

    fn decode(entry: &Value) -> Result<Self, Error> {
        match entry {
            Value::Bool(value) => Ok(*value),
            Value::String(text) => match text.trim() {
                "true" | "1" => Ok(true),
                "false" | "0" => Ok(false),
                other => Err(mismatch(format!("expected a boolean, found '{other}'"))),
            },
            Value::Number(num) => match num.as_u64() {
                Some(1) => Ok(true),
                Some(0) => Ok(false),
                _ => Err(mismatch(format!("expected a boolean, found {num}"))),
            },
            other => Err(mismatch(format!(
                "expected a boolean, found {}",
                describe(other)
            ))),
        }
    }
}

impl Codec for i32 {
    fn encode(&self) -> Value {
        Value::String(self.to_string())
    }

    fn decode(entry: &Value) -> Result<Self, Error> {
        match entry {
            Value::String(text) => text
                .trim()
                .parse::<i32>()
                .map_err(|err| mismatch(format!("expected an integer, found '{text}'")).with_source(err)),
            Value::Number(num) => num
                .as_i64()
                .and_then(|value| i32::try_from(value).ok())
                .ok_or_else(|| mismatch(format!("integer out of range: {num}"))),
            other => Err(mismatch(format!(
                "expected an integer, found {}",
                describe(other)
            ))),
        }
    }
}

impl Codec for f32 {
    fn encode(&self) -> Value {
        Value::String(self.to_string())
    }

    fn decode(entry: &Value) -> Result<Self, Error> {
        match entry {
            Value::String(text) => text
                .trim()
                .parse::<f32>()
                .map_err(|err| mismatch(format!("expected a number, found '{text}'")).with_source(err)),
            Value::Number(num) => num
                .as_f64()
                .map(|value| value as f32)
                .ok_or_else(|| mismatch(format!("expected a number, found {num}"))),
            other => Err(mismatch(format!(
                "expected a number, found {}",
                describe(other)
            ))),
        }
    }
}

impl Codec for Vec2 {
    fn encode(&self) -> Value {
        compound(&[("x", self.x), ("y", self.y)])
    }

    fn decode(entry: &Value) -> Result<Self, Error> {
        let [x, y] = components(entry, Kind::Vec2)?;
        Ok(Vec2 { x, y })
    }
}

impl Codec for Vec3 {
    fn encode(&self) -> Value {
        compound(&[("x", self.x), ("y", self.y), ("z", self.z)])
    }

    fn decode(entry: &Value) -> Result<Self, Error> {
        let [x, y, z] = components(entry, Kind::Vec3)?;
        Ok(Vec3 { x, y, z })
    }
}

impl Codec for Vec4 {
    fn encode(&self) -> Value {
        compound(&[("x", self.x), ("y", self.y), ("z", self.z), ("w", self.w)])
    }

    fn decode(entry: &Value) -> Result<Self, Error> {
        let [x, y, z, w] = components(entry, Kind::Vec4)?;
        Ok(Vec4 { x, y, z, w })
    }
}

impl Codec for Quat {
    fn encode(&self) -> Value {
        compound(&[("w", self.w), ("x", self.x), ("y", self.y), ("z", self.z)])
    }

    fn decode(entry: &Value) -> Result<Self, Error> {
        let [w, x, y, z] = components(entry, Kind::Quat)?;
        Ok(Quat { w, x, y, z })
    }
}

impl Codec for Color {
    fn encode(&self) -> Value {
        compound(&[("r", self.r), ("g", self.g), ("b", self.b)])
    }

    fn decode(entry: &Value) -> Result<Self, Error> {
        let [r, g, b] = components(entry, Kind::Color)?;
        Ok(Color { r, g, b })
    }
}

fn compound(parts: &[(&str, f32)]) -> Value {
    let mut map = Map::new();
    for (name, value) in parts {
        map.insert((*name).to_string(), value.encode());
    }
    Value::Object(map)
}

// Objects are read by component name. Positional arrays in encoding order
// are accepted for files written by tools that drop child names.
fn components<const N: usize>(entry: &Value, kind: Kind) -> Result<[f32; N], Error> {
    let names = kind.components();
    debug_assert_eq!(names.len(), N);
    let mut out = [0.0f32; N];
    match entry {
        Value::Object(map) => {
            for (slot, name) in out.iter_mut().zip(names) {
                let child = map.get(*name).ok_or_else(|| {
                    mismatch(format!("{kind} is missing component '{name}'"))
                })?;
                *slot = component(child, kind, name)?;
            }
        }
        Value::Array(items) if items.len() == N => {
            for ((slot, name), child) in out.iter_mut().zip(names).zip(items) {
                *slot = component(child, kind, name)?;
            }
        }
        other => {
            return Err(mismatch(format!(
                "expected {kind} object with components {}, found {}",
                names.join(", "),
                describe(other)
            )));
        }
    }
    Ok(out)
}

fn component(child: &Value, kind: Kind, name: &str) -> Result<f32, Error> {
    f32::decode(child).map_err(|err| {
        let detail = err.message().unwrap_or("invalid value").to_string();
        Error::new(ErrorKind::Mismatch).with_message(format!("{kind} component '{name}': {detail}"))
    })
}

fn mismatch(message: String) -> Error {
    Error::new(ErrorKind::Mismatch).with_message(message)
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Decodes `entry` as `kind`, for callers that only know the kind at runtime.
pub fn decode_as(kind: Kind, entry: &Value) -> Result<ParamValue, Error> {
    Ok(match kind {
        Kind::Bool => ParamValue::Bool(bool::decode(entry)?),
        Kind::Int => ParamValue::Int(i32::decode(entry)?),
        Kind::Float => ParamValue::Float(f32::decode(entry)?),
        Kind::Vec2 => ParamValue::Vec2(Vec2::decode(entry)?),
        Kind::Vec3 => ParamValue::Vec3(Vec3::decode(entry)?),
        Kind::Vec4 => ParamValue::Vec4(Vec4::decode(entry)?),
        Kind::Quat => ParamValue::Quat(Quat::decode(entry)?),
        Kind::Color => ParamValue::Color(Color::decode(entry)?),
    })
}

/// Best-effort guess of an entry's kind from its shape alone.
///
/// Objects with `x, y, z, w` are a `Vec4` unless `w` comes first, which is
/// how quaternions are written.
pub fn infer_kind(entry: &Value) -> Option<Kind> {
    match entry {
        Value::Bool(_) => Some(Kind::Bool),
        Value::Number(num) if num.is_i64() || num.is_u64() => Some(Kind::Int),
        Value::Number(_) => Some(Kind::Float),
        Value::String(text) => {
            let text = text.trim();
            if text == "true" || text == "false" {
                Some(Kind::Bool)
            } else if text.parse::<i64>().is_ok() {
                Some(Kind::Int)
            } else if text.parse::<f32>().is_ok() {
                Some(Kind::Float)
            } else {
                None
            }
        }
        Value::Object(map) => {
            let mut keys: Vec<&str> = map.keys().map(String::as_str).collect();
            let first = keys.first().copied();
            keys.sort_unstable();
            match keys.as_slice() {
                ["x", "y"] => Some(Kind::Vec2),
                ["x", "y", "z"] => Some(Kind::Vec3),
                ["b", "g", "r"] => Some(Kind::Color),
                ["w", "x", "y", "z"] if first == Some("w") => Some(Kind::Quat),
                ["w", "x", "y", "z"] => Some(Kind::Vec4),
                _ => None,
            }
        }
        Value::Null | Value::Array(_) => None,
    }
}
