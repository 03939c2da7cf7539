//! Port traits decoupling the domain from concrete infrastructure.

pub mod config_port;
pub mod tick_feed;
