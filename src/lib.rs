//! Emblem Tactics - turn-simulation core for a grid-based tactical RPG

pub mod ai;
pub mod combat;
pub mod core;
pub mod data;
pub mod event;
pub mod map;
pub mod render;
pub mod state;
pub mod support;
pub mod units;
