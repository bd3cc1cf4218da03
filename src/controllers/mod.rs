pub mod error;
pub mod power_controller;
