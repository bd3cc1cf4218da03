pub mod efficiency;
pub mod pipeline;
pub mod power_model;
pub mod solar_geometry;
pub mod thermal;
pub mod transposition;
