//! Relay core library — tenant configuration, webhook verification, behavior
//! dispatch, and reply delivery shared by the gateway and the CLI.

pub mod answer;
pub mod behavior;
pub mod config;
pub mod gateway;
pub mod line;
pub mod router;
