pub mod arena_protocol;
pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod match_state;
pub mod move_mapper;
pub mod rng;
pub mod sim;
pub mod threat;
pub mod types;
