//! Port traits at the edges of the domain.

pub mod config_port;
pub mod quote_port;
pub mod report_port;
