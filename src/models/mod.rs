pub mod classification;
pub mod extraction;
pub mod field;
pub mod record;
pub mod stage;

pub use classification::*;
pub use extraction::*;
pub use field::*;
pub use record::*;
pub use stage::*;
