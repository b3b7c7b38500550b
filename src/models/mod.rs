pub mod analysis;
pub mod enums;
pub mod task;

pub use analysis::*;
pub use enums::*;
pub use task::*;
