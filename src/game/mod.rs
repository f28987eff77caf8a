//! Rock-paper-scissors game modules

pub mod hub;
pub mod round;
pub mod rules;

pub use hub::{GameHub, HubHandle, Outbound};
