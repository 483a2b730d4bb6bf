pub mod board;
pub mod config;
pub mod label;
pub mod note;
pub mod opportunity;
pub mod stage;
