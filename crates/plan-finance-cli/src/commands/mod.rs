pub mod analysis;
pub mod ratios;
