pub mod wire;

pub use wire::{FramingError, HybridFrame, KemFrame, SchemeFamily, SealedFrame, WireLayout};
