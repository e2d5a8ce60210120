//! Domain entities. Pure data structures for the core business.
//!
//! No storage/IO types here — these are mapped from adapters.

use serde::{Deserialize, Serialize};

/// Name given to the default category created for every user.
pub const DEFAULT_CATEGORY_NAME: &str = "Boards";

/// A named grouping of boards, scoped to a (user, team) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub category_type: CategoryType,
    pub user_id: String,
    pub team_id: String,
    /// Creation time, Unix milliseconds.
    pub create_at: i64,
    /// Last update time, Unix milliseconds.
    pub update_at: i64,
}

impl Category {
    pub fn is_system(&self) -> bool {
        self.category_type == CategoryType::System
    }
}

/// Category kind. At most one `System` category may exist per (user, team);
/// it is the default "Boards" category and is never user-deletable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryType {
    Custom,
    System,
}

impl CategoryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryType::Custom => "custom",
            CategoryType::System => "system",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "system" => CategoryType::System,
            _ => CategoryType::Custom,
        }
    }
}

/// A category paired with its ordered list of board IDs.
///
/// Ordering is significant: reorders permute `board_ids` in place and a board
/// appears in at most one category per user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryBoards {
    #[serde(flatten)]
    pub category: Category,
    pub board_ids: Vec<String>,
}

/// Association between a user and a board they can access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardMember {
    pub board_id: String,
    pub user_id: String,
    pub kind: MembershipKind,
}

/// How the user got access to a board. Only `Explicit` grants qualify a board
/// for automatic inclusion in the default category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipKind {
    /// Directly granted, individual access.
    Explicit,
    /// Derived transitively (e.g. team-wide visibility).
    Synthetic,
}

/// Membership classifier: keep only explicitly-granted board IDs,
/// preserving input order. Pure filter, no side effects.
pub fn explicit_board_ids(members: &[BoardMember]) -> Vec<String> {
    members
        .iter()
        .filter(|m| m.kind == MembershipKind::Explicit)
        .map(|m| m.board_id.clone())
        .collect()
}
