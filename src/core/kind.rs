//! Purpose: Define the closed set of value kinds a live parameter may hold.
//! Exports: `Vec2`, `Vec3`, `Vec4`, `Quat`, `Color`, `Kind`, `ParamValue`, `ParamKind`.
//! Role: Compile-time boundary; only kinds listed here can be registered.
//! Invariants: `ParamKind` is sealed; every implementor has a codec and a handle variant.
//! Invariants: `ParamValue` carries exactly one variant per `Kind`.
use std::fmt;
use std::sync::Arc;

use super::codec::Codec;
use super::param::{Handle, Slot};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec4 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

/// Rotation quaternion; the default is the identity rotation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quat {
    pub w: f32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// RGB color without alpha.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl Vec3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl Vec4 {
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }
}

impl Quat {
    pub const IDENTITY: Quat = Quat::new(1.0, 0.0, 0.0, 0.0);

    pub const fn new(w: f32, x: f32, y: f32, z: f32) -> Self {
        Self { w, x, y, z }
    }
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Color {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub const fn gray(value: f32) -> Self {
        Self::new(value, value, value)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Kind {
    Bool,
    Int,
    Float,
    Vec2,
    Vec3,
    Vec4,
    Quat,
    Color,
}

impl Kind {
    pub const ALL: [Kind; 8] = [
        Kind::Bool,
        Kind::Int,
        Kind::Float,
        Kind::Vec2,
        Kind::Vec3,
        Kind::Vec4,
        Kind::Quat,
        Kind::Color,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Bool => "bool",
            Kind::Int => "int",
            Kind::Float => "float",
            Kind::Vec2 => "vec2",
            Kind::Vec3 => "vec3",
            Kind::Vec4 => "vec4",
            Kind::Quat => "quat",
            Kind::Color => "color",
        }
    }

    /// Component names of a compound kind, in encoding order.
    pub fn components(self) -> &'static [&'static str] {
        match self {
            Kind::Bool | Kind::Int | Kind::Float => &[],
            Kind::Vec2 => &["x", "y"],
            Kind::Vec3 => &["x", "y", "z"],
            Kind::Vec4 => &["x", "y", "z", "w"],
            Kind::Quat => &["w", "x", "y", "z"],
            Kind::Color => &["r", "g", "b"],
        }
    }

    pub fn is_compound(self) -> bool {
        !self.components().is_empty()
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value of any supported kind.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ParamValue {
    Bool(bool),
    Int(i32),
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Quat(Quat),
    Color(Color),
}

impl ParamValue {
    pub fn kind(&self) -> Kind {
        match self {
            ParamValue::Bool(_) => Kind::Bool,
            ParamValue::Int(_) => Kind::Int,
            ParamValue::Float(_) => Kind::Float,
            ParamValue::Vec2(_) => Kind::Vec2,
            ParamValue::Vec3(_) => Kind::Vec3,
            ParamValue::Vec4(_) => Kind::Vec4,
            ParamValue::Quat(_) => Kind::Quat,
            ParamValue::Color(_) => Kind::Color,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ParamValue::Bool(value) => value.encode(),
            ParamValue::Int(value) => value.encode(),
            ParamValue::Float(value) => value.encode(),
            ParamValue::Vec2(value) => value.encode(),
            ParamValue::Vec3(value) => value.encode(),
            ParamValue::Vec4(value) => value.encode(),
            ParamValue::Quat(value) => value.encode(),
            ParamValue::Color(value) => value.encode(),
        }
    }
}

mod sealed {
    pub trait Sealed {}

    impl Sealed for bool {}
    impl Sealed for i32 {}
    impl Sealed for f32 {}
    impl Sealed for super::Vec2 {}
    impl Sealed for super::Vec3 {}
    impl Sealed for super::Vec4 {}
    impl Sealed for super::Quat {}
    impl Sealed for super::Color {}
}

/// Types that can live inside a `LiveParam`.
pub trait ParamKind:
    sealed::Sealed + Codec + Clone + PartialEq + fmt::Debug + Send + Sync + 'static
{
    const KIND: Kind;

    fn into_value(self) -> ParamValue;

    #[doc(hidden)]
    fn handle(slot: Arc<Slot<Self>>) -> Handle;
}

macro_rules! param_kind {
    ($ty:ty, $variant:ident) => {
        impl ParamKind for $ty {
            const KIND: Kind = Kind::$variant;

            fn into_value(self) -> ParamValue {
                ParamValue::$variant(self)
            }

            fn handle(slot: Arc<Slot<Self>>) -> Handle {
                Handle::$variant(slot)
            }
        }
    };
}

param_kind!(bool, Bool);
param_kind!(i32, Int);
param_kind!(f32, Float);
param_kind!(Vec2, Vec2);
param_kind!(Vec3, Vec3);
param_kind!(Vec4, Vec4);
param_kind!(Quat, Quat);
param_kind!(Color, Color);

#[cfg(test)]
mod tests {
    use super::{Color, Kind, ParamKind, ParamValue, Quat, Vec3};

    #[test]
    fn quat_defaults_to_identity() {
        assert_eq!(Quat::default(), Quat::new(1.0, 0.0, 0.0, 0.0));
    }

    #[test]
    fn quat_components_encode_w_first() {
        assert_eq!(Kind::Quat.components(), &["w", "x", "y", "z"]);
        assert_eq!(Kind::Color.components(), &["r", "g", "b"]);
        assert!(!Kind::Float.is_compound());
    }

    #[test]
    fn values_report_their_kind() {
        assert_eq!(1.5f32.into_value().kind(), Kind::Float);
        assert_eq!(Vec3::new(1.0, 2.0, 3.0).into_value().kind(), Kind::Vec3);
        assert_eq!(ParamValue::Color(Color::gray(0.5)).kind(), Kind::Color);
        assert_eq!(<i32 as ParamKind>::KIND, Kind::Int);
    }

    #[test]
    fn kind_names_are_unique() {
        let mut names: Vec<&str> = Kind::ALL.iter().map(|kind| kind.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), Kind::ALL.len());
    }
}
