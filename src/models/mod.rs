pub mod api;
pub mod pv;
