mod durable;
mod filesystem;
mod traits;

pub use durable::{DurableWriter, RetryPolicy};
pub use filesystem::{TempFileReplace, ThreadSleep};
pub use traits::{AtomicReplace, Backoff};
