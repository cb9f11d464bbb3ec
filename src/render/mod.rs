//! Rendering Engine
//!
//! Frame table → chip state (per latched frame) → samples (per output tick).

pub mod block;
pub mod clock;
pub mod latch;

pub use block::{render_block, to_pcm};
pub use clock::RenderClock;
pub use latch::{latch, MixerFlags};
