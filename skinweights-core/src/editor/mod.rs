//! Live weight edits. Each operation reads the binding on entry and writes it back
//! before returning; nothing is cached between calls.

mod copy;
mod mirror;
mod transfer;

pub use copy::copy_weights;
pub use mirror::{mirror, MirrorOptions, MirrorSide};
pub use transfer::transfer;
