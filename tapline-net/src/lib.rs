// tapline-net/src/lib.rs
pub mod fetch;
pub mod github;
pub mod validation;

pub use fetch::HttpFetcher;
pub use github::GithubVisibility;
pub use validation::validate_url;
