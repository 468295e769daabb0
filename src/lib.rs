#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
// #![warn(clippy::cargo)]

pub mod accuracy;
pub mod analysis;
pub mod area;
pub mod config;
pub(crate) mod distributions;
pub mod error;
pub mod margin;
pub(crate) mod math;
pub mod proportion;
pub mod report;
pub mod weights;

pub use error::Error;

pub type Result<T> = ::std::result::Result<T, Error>;
