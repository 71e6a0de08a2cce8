use crate::{coordinator::CoordinatorError, fetcher::FetchError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Fetch error")]
    Fetch(#[from] FetchError),
    #[error("Coordinator error")]
    Coordinator(#[from] CoordinatorError),
}
