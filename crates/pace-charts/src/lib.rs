pub mod chart;
pub mod config;
pub mod logging;
pub mod runner;
pub mod source;
