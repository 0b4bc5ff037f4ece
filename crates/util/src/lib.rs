//! Small helpers shared by the intake crates.

pub mod naming;
pub mod path_processing;

pub use naming::{contains_any_hint, proper_name_from_slug};
pub use path_processing::expand_tilde;
