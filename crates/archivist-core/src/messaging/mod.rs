//! Outbound messaging: the port and the texts sent through it.

pub mod port;
pub mod texts;
