//! Application use cases. Orchestrate domain logic via ports.

pub mod category_service;

pub use category_service::CategoryBoardsService;
