//! In-memory CategoryStore for tests and lightweight embedding.
//!
//! State lives in a mutex-guarded map; no durability. Supports one-shot
//! failure injection so error-propagation paths can be exercised.

use crate::domain::{BoardMember, Category, CategoryBoards, DomainError};
use crate::ports::CategoryStore;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
struct Inner {
    /// Categories in insertion order (fetch order is stable).
    categories: Vec<Category>,
    /// category_id -> ordered board IDs.
    board_orders: HashMap<String, Vec<String>>,
    /// user_id -> memberships in grant order.
    members: HashMap<String, Vec<BoardMember>>,
    /// Name of the next store call that should fail, if any.
    fail_next: Option<String>,
}

/// In-memory store. Cheap to construct, safe to share via Arc.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a category together with its board order.
    pub fn seed_category(&self, category: Category, board_ids: &[&str]) {
        let mut inner = self.inner.lock().expect("memory store poisoned");
        inner
            .board_orders
            .insert(category.id.clone(), board_ids.iter().map(|b| b.to_string()).collect());
        inner.categories.push(category);
    }

    /// Insert a board membership record for its user.
    pub fn seed_member(&self, member: BoardMember) {
        let mut inner = self.inner.lock().expect("memory store poisoned");
        inner
            .members
            .entry(member.user_id.clone())
            .or_default()
            .push(member);
    }

    /// Total number of stored categories, across all users and teams.
    pub fn category_count(&self) -> usize {
        self.inner.lock().expect("memory store poisoned").categories.len()
    }

    /// Current board order of a category, if it exists.
    pub fn board_order(&self, category_id: &str) -> Option<Vec<String>> {
        self.inner
            .lock()
            .expect("memory store poisoned")
            .board_orders
            .get(category_id)
            .cloned()
    }

    /// Make the next store call named `call` fail with a storage error.
    pub fn fail_next(&self, call: &str) {
        self.inner.lock().expect("memory store poisoned").fail_next = Some(call.to_string());
    }

    fn check_failure(&self, call: &str) -> Result<(), DomainError> {
        let mut inner = self.inner.lock().expect("memory store poisoned");
        if inner.fail_next.as_deref() == Some(call) {
            inner.fail_next = None;
            return Err(DomainError::Store(format!("injected failure in {call}")));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl CategoryStore for MemoryStore {
    async fn get_user_category_boards(
        &self,
        user_id: &str,
        team_id: &str,
    ) -> Result<Vec<CategoryBoards>, DomainError> {
        self.check_failure("get_user_category_boards")?;
        let inner = self.inner.lock().expect("memory store poisoned");
        Ok(inner
            .categories
            .iter()
            .filter(|c| c.user_id == user_id && c.team_id == team_id)
            .map(|c| CategoryBoards {
                category: c.clone(),
                board_ids: inner.board_orders.get(&c.id).cloned().unwrap_or_default(),
            })
            .collect())
    }

    async fn create_category(&self, category: Category) -> Result<(), DomainError> {
        self.check_failure("create_category")?;
        let mut inner = self.inner.lock().expect("memory store poisoned");
        let duplicate_system = category.is_system()
            && inner.categories.iter().any(|c| {
                c.is_system() && c.user_id == category.user_id && c.team_id == category.team_id
            });
        if duplicate_system {
            return Err(DomainError::Store(format!(
                "system category already exists for user {} in team {}",
                category.user_id, category.team_id
            )));
        }
        inner.board_orders.insert(category.id.clone(), Vec::new());
        inner.categories.push(category);
        Ok(())
    }

    async fn get_category(&self, id: &str) -> Result<Category, DomainError> {
        self.check_failure("get_category")?;
        let inner = self.inner.lock().expect("memory store poisoned");
        inner
            .categories
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| DomainError::CategoryNotFound(id.to_string()))
    }

    async fn get_members_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<BoardMember>, DomainError> {
        self.check_failure("get_members_for_user")?;
        let inner = self.inner.lock().expect("memory store poisoned");
        Ok(inner.members.get(user_id).cloned().unwrap_or_default())
    }

    async fn add_update_category_board(
        &self,
        user_id: &str,
        board_id: &str,
        category_id: &str,
    ) -> Result<(), DomainError> {
        self.check_failure("add_update_category_board")?;
        let mut inner = self.inner.lock().expect("memory store poisoned");
        if !inner.categories.iter().any(|c| c.id == category_id) {
            return Err(DomainError::CategoryNotFound(category_id.to_string()));
        }

        // A board belongs to at most one category per user: detach first.
        let user_category_ids: Vec<String> = inner
            .categories
            .iter()
            .filter(|c| c.user_id == user_id)
            .map(|c| c.id.clone())
            .collect();
        for id in &user_category_ids {
            if let Some(order) = inner.board_orders.get_mut(id) {
                order.retain(|b| b != board_id);
            }
        }

        inner
            .board_orders
            .entry(category_id.to_string())
            .or_default()
            .push(board_id.to_string());
        Ok(())
    }

    async fn reorder_category_boards(
        &self,
        category_id: &str,
        board_order: &[String],
    ) -> Result<Vec<String>, DomainError> {
        self.check_failure("reorder_category_boards")?;
        let mut inner = self.inner.lock().expect("memory store poisoned");
        if !inner.categories.iter().any(|c| c.id == category_id) {
            return Err(DomainError::CategoryNotFound(category_id.to_string()));
        }
        inner
            .board_orders
            .insert(category_id.to_string(), board_order.to_vec());
        Ok(board_order.to_vec())
    }
}
