pub mod checkpoint;
pub mod dispatcher;
pub mod log;

pub use checkpoint::{completed_names, pending};
pub use dispatcher::{DEFAULT_WORKERS, Dispatcher, RunSummary};
pub use log::FragmentLog;
