#![forbid(unsafe_code)]

//! Command-line front end: configuration, estimates files, reports and the command pipeline.

pub mod commands;
pub mod config;
pub mod estimates;
pub mod logging;
pub mod report;
