pub mod hazards;
pub mod models;
pub mod offer;
pub mod record;
