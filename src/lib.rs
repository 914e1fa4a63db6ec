//! Reports user presence to a chat server plugin. Whenever the user becomes active the
//! `/plugins/<plugin-id>/` endpoint gets a "connected" ping, at most once per cooldown window,
//! so the server can deliver messages that were held back until the user is online.
//!

pub mod activity;
pub mod cli;
pub mod client;
pub mod config;
pub mod daemon;
pub mod input_api;
pub mod plugin;
pub mod utils;
