pub mod detection;
pub mod errors;
pub mod fertilizer;
pub mod model;
pub mod prediction;
pub mod upload;
