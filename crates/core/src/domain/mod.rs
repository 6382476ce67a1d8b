pub mod dataset;
pub mod product;
pub mod rule;
pub mod sale;
