pub mod auth_gate;

pub use auth_gate::*;
