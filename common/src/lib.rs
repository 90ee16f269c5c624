pub mod cpu_features;
mod log_setup;

pub use log_setup::{LogOutput, setup_logging};
