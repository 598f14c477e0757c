//! Hyperbol match simulation library.
//!
//! This module exposes the simulation components for use in tests and binaries.

pub mod arena;
pub mod ball;
pub mod bot;
pub mod config;
pub mod controls;
pub mod error;
pub mod game_loop;
pub mod observer;
pub mod scheduler;
pub mod spawn;
pub mod state;
pub mod vehicle;
