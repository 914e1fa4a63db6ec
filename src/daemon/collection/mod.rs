pub mod input;
pub mod poller;
