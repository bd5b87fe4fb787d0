//! Classical separation methods
//!
//! Each method takes channel slices by reference, reports its own progress
//! on a `0..1` scale and returns a new mono signal of the input length.

mod harmonic_percussive;
mod hpss;
mod instrumental;
mod vocal_removal;

pub use harmonic_percussive::separate_harmonic;
pub use hpss::{HpssOutput, energy_ratios, harmonic_ratio, hpss, hpss_masks};
pub use instrumental::isolate_instrumental;
pub use vocal_removal::{
    CenterMode, center_channel, remove_vocals, similarity_mask, suppress_vocal_bands,
};
