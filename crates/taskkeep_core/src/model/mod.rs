mod task;
pub mod timestamp;

pub use task::{CompletedTask, Task, TaskDraft, completed_projection, next_task_id, numeric_id};
