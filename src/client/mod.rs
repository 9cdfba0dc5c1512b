pub mod controller;
pub mod http;
pub mod state;

pub use controller::{MutationPolicy, TodoController};
pub use http::{HttpTodoApi, TodoApi};
pub use state::{SortOptions, TodoState, ViewFilter};
