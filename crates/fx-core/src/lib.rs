//! Platform-free models behind the motion effects layer.
//!
//! Everything here is plain data advanced by explicit calls: the web crate
//! feeds in browser samples and timestamps, steps the models inside
//! animation frames, and writes the results back to the DOM.

pub mod anim;
pub mod capability;
pub mod constants;
pub mod counter;
pub mod error;
pub mod field;
pub mod glass;
pub mod particles;
pub mod pointer;
pub mod registry;
pub mod reveal;
pub mod scroll;
pub mod spring;
pub mod velocity;

pub use anim::{Activity, Animate, EventKind, FrameGate, LoopState};
pub use capability::{CapabilitySignals, CapabilitySnapshot, Tier, Variant};
pub use error::{FxError, FxResult};
pub use registry::{ElementId, ElementRegistry};
pub use spring::{Spring, Spring2, SpringConfig};
