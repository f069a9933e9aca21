pub mod actions;
pub mod config;
pub mod evaluate;
pub mod mock;
pub mod state;
pub mod watch;
