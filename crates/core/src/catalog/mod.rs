pub mod generator;
pub mod summary;

pub use generator::{base_product, generate_products, initial_discount, VariationModel};
pub use summary::summarize;
