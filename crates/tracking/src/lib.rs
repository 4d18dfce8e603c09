//! Client side of route tracking: drawing routes by clicking on a map,
//! replaying them as a moving vehicle and reporting the simulated positions.

pub mod backend;
pub mod capture;
pub mod config;
pub mod error;
pub mod map;
pub mod playback;
pub mod session;
pub mod telemetry;
pub mod ticker;
pub mod view;
