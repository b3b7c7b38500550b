//! Task lifecycle: the shared store, the per-task runner and the source
//! file each task owns.

pub mod artifact;
pub mod error;
pub mod runner;
pub mod store;

pub use artifact::*;
pub use error::*;
pub use runner::*;
pub use store::*;
