//! Element wait/interact primitives for structural-path automation
//!
//! This crate provides the building blocks the portal workflow is made of:
//! - A locator table mapping logical targets to structural paths
//! - Bounded waits for presence and interactability, polled on an injectable clock
//! - Click with a scripted-activation fallback for intercepted pointer clicks
//! - Non-waiting optional lookup, form filling and hidden-element activation

pub mod errors;
mod locator;
mod primitives;
pub mod types;
mod waiting;

pub use errors::*;
pub use locator::*;
pub use primitives::*;
pub use types::*;
pub use waiting::*;
