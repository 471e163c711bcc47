mod http;
mod status;

pub use http::HttpMatchupApi;
pub use status::Endpoint;
