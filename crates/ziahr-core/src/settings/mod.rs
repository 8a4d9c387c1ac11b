//! Settings domain module.

mod model;

pub use model::{Settings, Theme};
