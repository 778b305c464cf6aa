pub mod context;
pub mod recipe;
pub mod trend;
