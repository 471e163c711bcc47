pub mod dto;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{MatchupError, Result};
pub use repository::MatchupStore;
