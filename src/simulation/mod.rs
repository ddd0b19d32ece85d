pub mod states;
pub mod errors;
pub mod params;
pub mod properties;
pub mod engine;
pub mod packing;
pub mod carving;
pub mod boundary;
pub mod scenario;
