pub mod cli;
pub mod color;
pub mod describe;
pub mod error;
pub mod pager;
pub mod subprocess;

pub use error::UtilError;

pub type Result<T> = std::result::Result<T, UtilError>;
