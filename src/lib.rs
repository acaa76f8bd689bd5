pub mod cli;
pub mod combat;
pub mod error;
pub mod parallel;
pub mod roster;
pub mod tournament;

pub use error::DuelError;
