//! API handlers module

pub mod board;
pub mod health;
pub mod proxy;
pub mod search;
pub mod session;
