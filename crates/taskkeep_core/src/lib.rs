pub mod config;
pub mod error;
pub mod model;
pub mod storage;
pub mod task_query;
pub mod task_store;

pub use error::AppError;
pub use model::{CompletedTask, Task};
pub use task_query::{CompletedSource, TaskQuery};
pub use task_store::{ErrorMode, TaskStore};
