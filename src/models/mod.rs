pub mod page;
pub mod patient;

pub use page::*;
pub use patient::*;
