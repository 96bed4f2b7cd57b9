/// Table-based methods for small discrete state spaces
pub mod tabular;
