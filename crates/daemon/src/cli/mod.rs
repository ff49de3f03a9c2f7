pub mod args;
pub mod op;
pub mod ops;

pub use ops::{Account, Daemon, Health, Init, Secret, Version};
