pub mod artifact;
pub mod common;
pub mod generation;
pub mod outcome;
pub mod variant;

pub use artifact::*;
pub use common::*;
pub use generation::*;
pub use outcome::*;
pub use variant::*;
