//! Audio input modules
//!
//! Segment bounds and analysis framing over caller-supplied mono PCM.

pub mod sample_buffer;
pub mod segment;
