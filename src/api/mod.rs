//! Purpose: Define the stable public Rust API boundary for liveparam.
//! Exports: Parameter cells, the bag, value kinds, documents, watch seam, and errors.
//! Role: Public, additive-only surface; hides internal module layout.
//! Invariants: This module is the only public path to core types.
//! Invariants: Internal modules remain private and are not directly exposed.

pub use crate::core::bag::{
    Bag, BagOptions, ChangeEvent, LoadReport, LoadStatus, WatchConfig, global as bag,
};
pub use crate::core::codec::{Codec, decode_as, infer_kind};
pub use crate::core::document::{Document, PARAMS_FIELD};
#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::kind::{Color, Kind, ParamKind, ParamValue, Quat, Vec2, Vec3, Vec4};
pub use crate::core::param::{LiveParam, ParamId, UpdateFn};
pub use crate::core::watch::{ChangeFn, NotifyWatch, Subscription, WatchService};
