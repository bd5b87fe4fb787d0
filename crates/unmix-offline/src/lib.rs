//! unmix-offline: file-to-file separation
//!
//! ```text
//! ┌─────────────┐   ┌──────────────────┐   ┌──────────────┐
//! │ Decoder     │ → │ SeparationEngine │ → │ Encoder      │
//! │ (symphonia) │   │ (any backend)    │   │ (WAV / FLAC) │
//! └─────────────┘   └──────────────────┘   └──────────────┘
//!     0.0-0.2             0.2-0.9              0.9-1.0
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use unmix_offline::{run_job, SeparationJob};
//! use unmix_separation::{NoProgress, SeparationEngine, SeparationMethod};
//!
//! let job = SeparationJob::builder()
//!     .input("song.mp3")
//!     .output("karaoke.flac")
//!     .method(SeparationMethod::VocalRemoval)
//!     .build()?;
//!
//! let result = run_job(&SeparationEngine::new(), &job, &mut NoProgress)?;
//! ```

mod decoder;
mod encoder;
mod error;
mod formats;
mod job;
mod pipeline;

pub use decoder::*;
pub use encoder::*;
pub use error::*;
pub use formats::*;
pub use job::*;
pub use pipeline::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
