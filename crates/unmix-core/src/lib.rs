//! unmix-core: Shared types for the Unmix separation workspace
//!
//! Provides the planar [`AudioBuffer`] every pipeline stage consumes and
//! produces, plus sample-level helpers (gain, level conversion, fades).

mod buffer;
mod error;
mod sample;

pub use buffer::*;
pub use error::*;
pub use sample::*;
