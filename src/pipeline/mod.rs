pub mod extraction;
pub mod repair;
pub mod structuring;
