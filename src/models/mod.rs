pub mod factory;
pub mod todo;
