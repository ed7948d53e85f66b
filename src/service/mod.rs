pub mod todo;

pub use todo::{ServiceError, TodoService};
