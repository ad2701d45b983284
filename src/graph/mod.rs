pub mod assembler;
pub mod edge;
pub mod node;
pub mod source;
pub mod workflow;

pub use assembler::*;
pub use edge::*;
pub use node::*;
pub use source::*;
pub use workflow::*;
