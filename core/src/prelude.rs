pub use crate::coordinator::{Coordinator, CoordinatorError};
pub use crate::error::Error;
pub use crate::event::EventRecord;
pub use crate::fetcher::{FetchError, Fetcher};
pub use crate::loader::{LoadRequest, LoadResult, LoadState, Loader, ResultSink};
