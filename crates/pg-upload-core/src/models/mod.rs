pub mod introspection;
pub mod value;

pub use introspection::*;
pub use value::*;
