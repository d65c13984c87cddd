//! Core type aliases and re-exports

pub use glam::{
    Vec3, Vec4,
    Mat3, Mat4,
    Quat,
};

/// Standard Result type for the engine
pub type Result<T> = std::result::Result<T, crate::core::error::Error>;

/// A point on the build-step timeline. Steps start at 1.
pub type Step = u32;

/// Sentinel step. As a show step it means "hidden for the whole timeline",
/// as a hide step it means "never hidden".
pub const STEP_MAX: Step = u32::MAX;

/// LDraw "current color": inherits the color of the placing piece.
pub const COLOR_CURRENT: u32 = 16;
