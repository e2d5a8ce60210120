//! Core domain layer. No external I/O dependencies.
//!
//! Entities and business rules live here. Dependencies flow inward.

pub mod entities;
pub mod errors;

pub use entities::{
    explicit_board_ids, BoardMember, Category, CategoryBoards, CategoryType, MembershipKind,
    DEFAULT_CATEGORY_NAME,
};
pub use errors::DomainError;
