// Library exports for proclog, the log-capture core of a process supervisor

pub mod cli;
pub mod config;
pub mod error;
pub mod logs;
