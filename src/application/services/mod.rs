//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (FileSystem)
//! but are themselves concrete structs, not traits.

mod loader;
mod session;

pub use loader::StepLoader;
pub use session::{Action, AnimationSettings, Session, SessionSettings};
