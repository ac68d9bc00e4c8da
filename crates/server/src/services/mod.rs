//! External service clients.

pub mod realtime;
