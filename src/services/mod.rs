// src/services/mod.rs
pub mod bond_risk;
pub mod cache;
pub mod calculations;
pub mod consensus_csv;
pub mod estimates;
pub mod forward_eps;
pub mod macro_trend;
pub mod narrative;
pub mod quarter_map;
pub mod sources;
pub mod ticker;
