//! Outbound ports. Application calls into infrastructure.
//!
//! Implemented by adapters.

use crate::domain::{BoardMember, Category, CategoryBoards, DomainError};

/// Store port. Persists categories, board-category associations, and board
/// memberships for the category core.
///
/// An absent user/team yields empty lists, not errors. Uniqueness of the
/// system category per (user, team) is enforced here, not by the use cases:
/// concurrent default-category creation for the same user must lose the race
/// with a constraint error rather than produce duplicates.
#[async_trait::async_trait]
pub trait CategoryStore: Send + Sync {
    /// Fetch all categories with their ordered board IDs for a user/team.
    /// Returns an empty list when the user has no categories yet.
    async fn get_user_category_boards(
        &self,
        user_id: &str,
        team_id: &str,
    ) -> Result<Vec<CategoryBoards>, DomainError>;

    /// Persist a new category. The caller supplies the ID.
    async fn create_category(&self, category: Category) -> Result<(), DomainError>;

    /// Fetch a category by ID after creation.
    async fn get_category(&self, id: &str) -> Result<Category, DomainError>;

    /// Fetch all board memberships (explicit and synthetic) for a user.
    async fn get_members_for_user(&self, user_id: &str)
        -> Result<Vec<BoardMember>, DomainError>;

    /// Associate one board with a category for a user. Moves the board if it
    /// already belongs to another of the user's categories.
    async fn add_update_category_board(
        &self,
        user_id: &str,
        board_id: &str,
        category_id: &str,
    ) -> Result<(), DomainError>;

    /// Persist a new board order for a category and return the committed order.
    async fn reorder_category_boards(
        &self,
        category_id: &str,
        board_order: &[String],
    ) -> Result<Vec<String>, DomainError>;
}
