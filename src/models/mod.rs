pub mod category;
pub mod task;
pub mod user;

pub use category::{Category, CategoryInput};
pub use task::{
    CreateTaskInput, NewTask, Task, TaskChanges, TaskPriority, TaskStatus, UpdateTaskInput,
};
pub use user::{NewUser, PublicUser, User};
