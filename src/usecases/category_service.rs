//! Category reconciliation: default-category provisioning and board reordering.
//!
//! - `get_user_category_boards` guarantees exactly one system "Boards" category
//! - The default category is created lazily, on the first fetch that finds none
//! - Only explicit (non-synthetic) memberships populate the default category
//! - Reorders are committed only when the caller reaffirms the full board set

use crate::domain::{
    explicit_board_ids, Category, CategoryBoards, CategoryType, DomainError,
    DEFAULT_CATEGORY_NAME,
};
use crate::ports::CategoryStore;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Category service. Reconciles a user's board categories against the Store.
pub struct CategoryBoardsService {
    store: Arc<dyn CategoryStore>,
}

impl CategoryBoardsService {
    pub fn new(store: Arc<dyn CategoryStore>) -> Self {
        Self { store }
    }

    /// Fetch all category-board groupings for a user/team, creating the
    /// default "Boards" category on first access.
    ///
    /// Once a system category exists the stored list is returned as-is:
    /// its contents are managed by ordinary add/remove flows afterwards,
    /// never recomputed from memberships.
    pub async fn get_user_category_boards(
        &self,
        user_id: &str,
        team_id: &str,
    ) -> Result<Vec<CategoryBoards>, DomainError> {
        let existing = self.store.get_user_category_boards(user_id, team_id).await?;
        if existing.iter().any(|cb| cb.category.is_system()) {
            return Ok(existing);
        }

        let boards_category = self
            .create_boards_category(user_id, team_id, &existing)
            .await?;

        let mut result = existing;
        result.push(boards_category);
        Ok(result)
    }

    /// Create the system "Boards" category and populate it with the boards the
    /// user has explicit access to. Idempotent: if `existing` already carries a
    /// system category it is returned unchanged.
    ///
    /// Association calls are issued one board at a time; a failure aborts the
    /// operation without rolling back boards already associated.
    async fn create_boards_category(
        &self,
        user_id: &str,
        team_id: &str,
        existing: &[CategoryBoards],
    ) -> Result<CategoryBoards, DomainError> {
        if let Some(cb) = existing.iter().find(|cb| cb.category.is_system()) {
            return Ok(cb.clone());
        }

        let now = Utc::now().timestamp_millis();
        let category_id = Uuid::new_v4().to_string();
        self.store
            .create_category(Category {
                id: category_id.clone(),
                name: DEFAULT_CATEGORY_NAME.to_string(),
                category_type: CategoryType::System,
                user_id: user_id.to_string(),
                team_id: team_id.to_string(),
                create_at: now,
                update_at: now,
            })
            .await?;
        let created = self.store.get_category(&category_id).await?;

        let members = self.store.get_members_for_user(user_id).await?;
        let mut board_ids = Vec::new();
        for board_id in explicit_board_ids(&members) {
            // Boards already placed in one of the user's categories stay there.
            let already_categorized = existing
                .iter()
                .any(|cb| cb.board_ids.iter().any(|b| *b == board_id));
            if already_categorized {
                continue;
            }

            self.store
                .add_update_category_board(user_id, &board_id, &created.id)
                .await?;
            board_ids.push(board_id);
        }

        info!(
            user_id,
            team_id,
            category_id = %created.id,
            boards = board_ids.len(),
            "created default Boards category"
        );

        Ok(CategoryBoards {
            category: created,
            board_ids,
        })
    }

    /// Permute the board order within one category and return the committed
    /// order. The proposed order must reaffirm the category's exact current
    /// board set; any omission, addition, or duplicate is rejected before the
    /// Store is touched.
    pub async fn reorder_category_boards(
        &self,
        user_id: &str,
        team_id: &str,
        category_id: &str,
        new_order: &[String],
    ) -> Result<Vec<String>, DomainError> {
        let existing = self.store.get_user_category_boards(user_id, team_id).await?;
        let current = existing
            .iter()
            .find(|cb| cb.category.id == category_id)
            .ok_or_else(|| DomainError::CategoryNotFound(category_id.to_string()))?;

        verify_board_set(category_id, &current.board_ids, new_order)?;

        let committed = self
            .store
            .reorder_category_boards(category_id, new_order)
            .await?;

        info!(
            user_id,
            category_id,
            boards = committed.len(),
            "reordered category boards"
        );

        Ok(committed)
    }
}

/// Check that `proposed` is a permutation of `current` (multiset equality).
fn verify_board_set(
    category_id: &str,
    current: &[String],
    proposed: &[String],
) -> Result<(), DomainError> {
    if current.len() != proposed.len() {
        return Err(DomainError::BoardSetMismatch {
            category_id: category_id.to_string(),
            reason: format!("expected {} boards, got {}", current.len(), proposed.len()),
        });
    }

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for board_id in current {
        *counts.entry(board_id.as_str()).or_default() += 1;
    }
    for board_id in proposed {
        match counts.get_mut(board_id.as_str()) {
            Some(n) if *n > 0 => *n -= 1,
            _ => {
                return Err(DomainError::BoardSetMismatch {
                    category_id: category_id.to_string(),
                    reason: format!("board {board_id} is duplicated or not in the category"),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::persistence::memory_store::MemoryStore;
    use crate::domain::{BoardMember, MembershipKind};

    fn service(store: &Arc<MemoryStore>) -> CategoryBoardsService {
        CategoryBoardsService::new(Arc::clone(store) as Arc<dyn CategoryStore>)
    }

    fn member(board_id: &str, kind: MembershipKind) -> BoardMember {
        BoardMember {
            board_id: board_id.to_string(),
            user_id: "user_id".to_string(),
            kind,
        }
    }

    fn category(id: &str, name: &str, category_type: CategoryType) -> Category {
        Category {
            id: id.to_string(),
            name: name.to_string(),
            category_type,
            user_id: "user_id".to_string(),
            team_id: "team_id".to_string(),
            create_at: 0,
            update_at: 0,
        }
    }

    #[tokio::test]
    async fn creates_default_category_with_explicit_boards() {
        let store = Arc::new(MemoryStore::new());
        store.seed_member(member("board_id_1", MembershipKind::Explicit));
        store.seed_member(member("board_id_2", MembershipKind::Explicit));
        store.seed_member(member("board_id_3", MembershipKind::Explicit));

        let result = service(&store)
            .get_user_category_boards("user_id", "team_id")
            .await
            .unwrap();

        assert_eq!(result.len(), 1);
        let boards = &result[0];
        assert_eq!(boards.category.name, "Boards");
        assert!(boards.category.is_system());
        assert_eq!(
            boards.board_ids,
            vec!["board_id_1", "board_id_2", "board_id_3"]
        );
        // associations were persisted, in classification order
        assert_eq!(
            store.board_order(&boards.category.id).unwrap(),
            boards.board_ids
        );
    }

    #[tokio::test]
    async fn creates_empty_default_category_without_memberships() {
        let store = Arc::new(MemoryStore::new());

        let result = service(&store)
            .get_user_category_boards("user_id", "team_id")
            .await
            .unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].category.name, "Boards");
        assert!(result[0].board_ids.is_empty());
    }

    #[tokio::test]
    async fn returns_stored_list_unchanged_when_system_category_exists() {
        let store = Arc::new(MemoryStore::new());
        store.seed_category(
            category("boards_category_id", "Boards", CategoryType::System),
            &["board_id_1", "board_id_2"],
        );
        // a newer explicit membership must NOT trigger recomputation
        store.seed_member(member("board_id_3", MembershipKind::Explicit));

        let result = service(&store)
            .get_user_category_boards("user_id", "team_id")
            .await
            .unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].board_ids, vec!["board_id_1", "board_id_2"]);
        assert_eq!(store.category_count(), 1);
    }

    #[tokio::test]
    async fn result_contains_exactly_one_system_category() {
        let store = Arc::new(MemoryStore::new());
        store.seed_category(
            category("category_id_1", "Work", CategoryType::Custom),
            &["board_id_1"],
        );
        store.seed_member(member("board_id_2", MembershipKind::Explicit));

        let result = service(&store)
            .get_user_category_boards("user_id", "team_id")
            .await
            .unwrap();

        let system_entries = result
            .iter()
            .filter(|cb| cb.category.is_system())
            .count();
        assert_eq!(system_entries, 1);
        assert_eq!(result.len(), 2);
    }

    #[tokio::test]
    async fn synthetic_memberships_never_populate_the_default_category() {
        let store = Arc::new(MemoryStore::new());
        store.seed_member(member("board_id_1", MembershipKind::Synthetic));
        store.seed_member(member("board_id_2", MembershipKind::Synthetic));
        store.seed_member(member("board_id_3", MembershipKind::Synthetic));

        let boards = service(&store)
            .create_boards_category("user_id", "team_id", &[])
            .await
            .unwrap();

        assert_eq!(boards.category.name, "Boards");
        assert!(boards.board_ids.is_empty());
    }

    #[tokio::test]
    async fn mixed_memberships_keep_only_explicit_boards() {
        let store = Arc::new(MemoryStore::new());
        store.seed_member(member("board_id_1", MembershipKind::Explicit));
        store.seed_member(member("board_id_2", MembershipKind::Synthetic));
        store.seed_member(member("board_id_3", MembershipKind::Synthetic));

        let boards = service(&store)
            .create_boards_category("user_id", "team_id", &[])
            .await
            .unwrap();

        assert_eq!(boards.board_ids, vec!["board_id_1"]);
    }

    #[tokio::test]
    async fn boards_already_categorized_are_not_reassociated() {
        let store = Arc::new(MemoryStore::new());
        store.seed_category(
            category("category_id_1", "Work", CategoryType::Custom),
            &["board_id_1"],
        );
        store.seed_member(member("board_id_1", MembershipKind::Explicit));
        store.seed_member(member("board_id_2", MembershipKind::Explicit));

        let svc = service(&store);
        let existing = store
            .get_user_category_boards("user_id", "team_id")
            .await
            .unwrap();
        let boards = svc
            .create_boards_category("user_id", "team_id", &existing)
            .await
            .unwrap();

        assert_eq!(boards.board_ids, vec!["board_id_2"]);
        // board_id_1 stayed in its custom category
        assert_eq!(
            store.board_order("category_id_1").unwrap(),
            vec!["board_id_1"]
        );
    }

    #[tokio::test]
    async fn create_boards_category_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        store.seed_category(
            category("boards_category_id", "Boards", CategoryType::System),
            &["board_id_1"],
        );

        let existing = store
            .get_user_category_boards("user_id", "team_id")
            .await
            .unwrap();
        let boards = service(&store)
            .create_boards_category("user_id", "team_id", &existing)
            .await
            .unwrap();

        assert_eq!(boards.category.id, "boards_category_id");
        assert_eq!(boards.board_ids, vec!["board_id_1"]);
        assert_eq!(store.category_count(), 1);
    }

    #[tokio::test]
    async fn category_creation_failure_propagates() {
        let store = Arc::new(MemoryStore::new());
        store.fail_next("create_category");

        let err = service(&store)
            .get_user_category_boards("user_id", "team_id")
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Store(_)));
        assert_eq!(store.category_count(), 0);
    }

    #[tokio::test]
    async fn fetch_failure_propagates_before_any_creation() {
        let store = Arc::new(MemoryStore::new());
        store.fail_next("get_user_category_boards");

        let err = service(&store)
            .get_user_category_boards("user_id", "team_id")
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Store(_)));
        assert_eq!(store.category_count(), 0);
    }

    #[tokio::test]
    async fn category_retrieval_failure_propagates() {
        let store = Arc::new(MemoryStore::new());
        store.seed_member(member("board_id_1", MembershipKind::Explicit));
        store.fail_next("get_category");

        let err = service(&store)
            .get_user_category_boards("user_id", "team_id")
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Store(_)));
        // the aborted run associated no boards
        let stored = store
            .get_user_category_boards("user_id", "team_id")
            .await
            .unwrap();
        assert!(stored.iter().all(|cb| cb.board_ids.is_empty()));
    }

    #[tokio::test]
    async fn member_lookup_failure_propagates() {
        let store = Arc::new(MemoryStore::new());
        store.fail_next("get_members_for_user");

        let err = service(&store)
            .get_user_category_boards("user_id", "team_id")
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Store(_)));
    }

    #[tokio::test]
    async fn association_failure_aborts_without_result() {
        let store = Arc::new(MemoryStore::new());
        store.seed_member(member("board_id_1", MembershipKind::Explicit));
        store.fail_next("add_update_category_board");

        let err = service(&store)
            .get_user_category_boards("user_id", "team_id")
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Store(_)));
    }

    fn seed_reorder_fixture(store: &MemoryStore) {
        store.seed_category(
            category("category_id_1", "Category 1", CategoryType::Custom),
            &["board_id_1", "board_id_2"],
        );
        store.seed_category(
            category("category_id_2", "Boards", CategoryType::System),
            &["board_id_3"],
        );
        store.seed_category(
            category("category_id_3", "Category 3", CategoryType::Custom),
            &[],
        );
    }

    #[tokio::test]
    async fn reorder_commits_a_full_permutation() {
        let store = Arc::new(MemoryStore::new());
        seed_reorder_fixture(&store);

        let new_order = vec!["board_id_2".to_string(), "board_id_1".to_string()];
        let committed = service(&store)
            .reorder_category_boards("user_id", "team_id", "category_id_1", &new_order)
            .await
            .unwrap();

        assert_eq!(committed, new_order);
        assert_eq!(store.board_order("category_id_1").unwrap(), new_order);
    }

    #[tokio::test]
    async fn reorder_rejects_an_incomplete_board_set() {
        let store = Arc::new(MemoryStore::new());
        store.seed_category(
            category("category_id_1", "Category 1", CategoryType::Custom),
            &["board_id_1", "board_id_2", "board_id_3"],
        );

        let err = service(&store)
            .reorder_category_boards(
                "user_id",
                "team_id",
                "category_id_1",
                &["board_id_2".to_string(), "board_id_1".to_string()],
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::BoardSetMismatch { .. }));
        // no mutation happened
        assert_eq!(
            store.board_order("category_id_1").unwrap(),
            vec!["board_id_1", "board_id_2", "board_id_3"]
        );
    }

    #[tokio::test]
    async fn reorder_rejects_unknown_boards() {
        let store = Arc::new(MemoryStore::new());
        seed_reorder_fixture(&store);

        let err = service(&store)
            .reorder_category_boards(
                "user_id",
                "team_id",
                "category_id_1",
                &["board_id_2".to_string(), "board_id_9".to_string()],
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::BoardSetMismatch { .. }));
    }

    #[tokio::test]
    async fn reorder_rejects_duplicated_boards() {
        let store = Arc::new(MemoryStore::new());
        seed_reorder_fixture(&store);

        let err = service(&store)
            .reorder_category_boards(
                "user_id",
                "team_id",
                "category_id_1",
                &["board_id_1".to_string(), "board_id_1".to_string()],
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::BoardSetMismatch { .. }));
        assert_eq!(
            store.board_order("category_id_1").unwrap(),
            vec!["board_id_1", "board_id_2"]
        );
    }

    #[tokio::test]
    async fn reorder_store_failure_propagates_after_validation() {
        let store = Arc::new(MemoryStore::new());
        seed_reorder_fixture(&store);
        store.fail_next("reorder_category_boards");

        let err = service(&store)
            .reorder_category_boards(
                "user_id",
                "team_id",
                "category_id_1",
                &["board_id_2".to_string(), "board_id_1".to_string()],
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Store(_)));
        assert_eq!(
            store.board_order("category_id_1").unwrap(),
            vec!["board_id_1", "board_id_2"]
        );
    }

    #[tokio::test]
    async fn reorder_of_unknown_category_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        seed_reorder_fixture(&store);

        let err = service(&store)
            .reorder_category_boards(
                "user_id",
                "team_id",
                "category_id_9",
                &["board_id_1".to_string()],
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::CategoryNotFound(_)));
    }
}
