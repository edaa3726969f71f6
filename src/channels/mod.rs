pub mod base;
pub mod manager;
pub mod qq;
pub mod utils;
