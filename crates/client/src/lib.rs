pub mod api;
pub mod config;
pub mod error;
pub mod mutator;
pub mod session;
pub mod traits;

pub use api::HttpMatchupApi;
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use mutator::{Completion, OptimisticMutator, RefreshScope};
pub use session::{Identity, SessionContext, StaticSession};
pub use traits::MatchupApi;
