mod autopilot;
mod bootstrap;
mod config;
mod error;
pub(crate) mod loop_runner;
mod session_log;
mod telemetry;
