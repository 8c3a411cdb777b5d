pub mod address;
pub mod config;
pub mod connection;
pub mod datatypes;
pub mod description;
pub mod display;
pub mod error;
pub mod packet;
pub mod poller;
pub mod presence;
pub mod renderer;
pub mod resolve;
pub mod source;
pub mod state;
pub mod status;
pub mod watcher;
