//! Matchmaking - room registry and seat assignment

pub mod registry;
