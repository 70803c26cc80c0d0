pub mod apply;
pub mod connection;
pub mod plan;
pub mod render;
pub mod validate;

pub use apply::*;
pub use connection::*;
pub use plan::*;
pub use validate::*;
