//! Application layer: services and use cases
//!
//! This layer orchestrates domain logic and depends on I/O boundary traits.

pub mod dataset;
pub mod error;
pub mod error_ext;
pub mod render;
pub mod services;

pub use dataset::{discover, Dataset, Dimension};
pub use error::{ApplicationError, ApplicationResult};
pub use error_ext::IoResultExt;
pub use render::{build_draw_list, ColorBy, DrawList, RenderOptions, Shading};
