// Domain layer module
pub mod base;
pub mod value_objects;
pub mod aggregates;

pub use base::*;
pub use value_objects::*;
pub use aggregates::*;
