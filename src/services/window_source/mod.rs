//! Window source and border painter: responsibility and boundaries
//!
//! This module and its submodules are responsible ONLY for two narrow
//! operations against the OS: taking a snapshot of the currently visible
//! top-level windows and painting one window's border. They MUST NOT contain
//! rule matching, animation or diffing logic. All color decisions are made by
//! the update cycle (see `services::scheduler`).

mod dry_run;
#[cfg(windows)]
mod dwm;
#[cfg_attr(not(windows), allow(dead_code))]
mod process_cache;
mod r#trait;

#[cfg(test)]
pub mod testing;

pub use self::r#trait::{create_backend, Backend, BorderPainter, WindowSource};
