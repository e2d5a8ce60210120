//! SQLite-backed CategoryStore via libsql.
//!
//! One database file (categories.db) in the given base directory. The
//! single-system-category invariant is enforced with a partial unique index on
//! (user_id, team_id) WHERE type = 'system': concurrent default-category
//! creation loses the race with a constraint error instead of writing a
//! duplicate. Board-category rows are keyed by (user_id, board_id), so a board
//! belongs to at most one category per user.

use crate::domain::{BoardMember, Category, CategoryBoards, CategoryType, DomainError, MembershipKind};
use crate::ports::CategoryStore;
use libsql::{params, Database};
use std::path::{Path, PathBuf};
use tracing::info;

const CATEGORIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS categories (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    type TEXT NOT NULL,
    user_id TEXT NOT NULL,
    team_id TEXT NOT NULL,
    create_at INTEGER NOT NULL,
    update_at INTEGER NOT NULL
)"#;

const SYSTEM_CATEGORY_INDEX: &str = r#"
CREATE UNIQUE INDEX IF NOT EXISTS idx_one_system_category
ON categories (user_id, team_id) WHERE type = 'system'"#;

const CATEGORY_BOARDS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS category_boards (
    user_id TEXT NOT NULL,
    board_id TEXT NOT NULL,
    category_id TEXT NOT NULL,
    sort_order INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (user_id, board_id)
)"#;

const BOARD_MEMBERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS board_members (
    user_id TEXT NOT NULL,
    board_id TEXT NOT NULL,
    synthetic INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (user_id, board_id)
)"#;

/// SQLite store. Call [`SqliteStore::connect`] once at startup; the returned
/// store is safe to share via Arc.
pub struct SqliteStore {
    db: Database,
    db_path: PathBuf,
}

impl SqliteStore {
    /// Connect to (or create) the database and ensure the schema exists.
    ///
    /// Sets WAL mode and synchronous=NORMAL for concurrent read/write without
    /// sacrificing durability.
    pub async fn connect(base_dir: impl AsRef<Path>) -> Result<Self, DomainError> {
        let base = base_dir.as_ref();
        std::fs::create_dir_all(base).map_err(|e| DomainError::Store(e.to_string()))?;
        let db_path = base.join("categories.db");
        let path_str = db_path.to_string_lossy();
        let db = libsql::Builder::new_local(path_str.as_ref())
            .build()
            .await
            .map_err(|e| DomainError::Store(e.to_string()))?;
        let conn = db.connect().map_err(|e| DomainError::Store(e.to_string()))?;

        // PRAGMA returns a row (new value); use query and consume rows
        // (execute fails when rows are returned).
        let mut wal_rows = conn
            .query("PRAGMA journal_mode=WAL", ())
            .await
            .map_err(|e| DomainError::Store(format!("WAL pragma failed: {}", e)))?;
        while wal_rows
            .next()
            .await
            .map_err(|e| DomainError::Store(e.to_string()))?
            .is_some()
        {}
        let mut sync_rows = conn
            .query("PRAGMA synchronous=NORMAL", ())
            .await
            .map_err(|e| DomainError::Store(format!("synchronous pragma failed: {}", e)))?;
        while sync_rows
            .next()
            .await
            .map_err(|e| DomainError::Store(e.to_string()))?
            .is_some()
        {}

        for ddl in [
            CATEGORIES_TABLE,
            SYSTEM_CATEGORY_INDEX,
            CATEGORY_BOARDS_TABLE,
            BOARD_MEMBERS_TABLE,
        ] {
            conn.execute(ddl, ())
                .await
                .map_err(|e| DomainError::Store(e.to_string()))?;
        }

        info!(path = %db_path.display(), "SQLite category store connected (WAL)");

        Ok(Self {
            db,
            db_path: db_path.to_path_buf(),
        })
    }

    /// Path of the backing database file.
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn conn(&self) -> Result<libsql::Connection, DomainError> {
        self.db.connect().map_err(|e| DomainError::Store(e.to_string()))
    }

    /// Record a board membership. Not part of the CategoryStore port: the
    /// enclosing application writes memberships, this core only reads them.
    pub async fn add_board_member(&self, member: &BoardMember) -> Result<(), DomainError> {
        let conn = self.conn()?;
        let synthetic = match member.kind {
            MembershipKind::Synthetic => 1i64,
            MembershipKind::Explicit => 0i64,
        };
        conn.execute(
            r#"
            INSERT INTO board_members (user_id, board_id, synthetic)
            VALUES (?1, ?2, ?3)
            ON CONFLICT (user_id, board_id) DO UPDATE SET synthetic = excluded.synthetic
            "#,
            params![member.user_id.as_str(), member.board_id.as_str(), synthetic],
        )
        .await
        .map_err(|e| DomainError::Store(e.to_string()))?;
        Ok(())
    }

    async fn category_board_ids(
        &self,
        conn: &libsql::Connection,
        category_id: &str,
    ) -> Result<Vec<String>, DomainError> {
        let mut rows = conn
            .query(
                r#"
                SELECT board_id FROM category_boards
                WHERE category_id = ?1
                ORDER BY sort_order, rowid
                "#,
                params![category_id],
            )
            .await
            .map_err(|e| DomainError::Store(e.to_string()))?;
        let mut board_ids = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DomainError::Store(e.to_string()))?
        {
            let board_id: String = row.get(0).map_err(|e| DomainError::Store(e.to_string()))?;
            board_ids.push(board_id);
        }
        Ok(board_ids)
    }

    fn row_to_category(row: &libsql::Row) -> Result<Category, DomainError> {
        let id: String = row.get(0).map_err(|e| DomainError::Store(e.to_string()))?;
        let name: String = row.get(1).map_err(|e| DomainError::Store(e.to_string()))?;
        let category_type: String = row.get(2).map_err(|e| DomainError::Store(e.to_string()))?;
        let user_id: String = row.get(3).map_err(|e| DomainError::Store(e.to_string()))?;
        let team_id: String = row.get(4).map_err(|e| DomainError::Store(e.to_string()))?;
        let create_at: i64 = row.get(5).map_err(|e| DomainError::Store(e.to_string()))?;
        let update_at: i64 = row.get(6).map_err(|e| DomainError::Store(e.to_string()))?;
        Ok(Category {
            id,
            name,
            category_type: CategoryType::parse(&category_type),
            user_id,
            team_id,
            create_at,
            update_at,
        })
    }
}

#[async_trait::async_trait]
impl CategoryStore for SqliteStore {
    async fn get_user_category_boards(
        &self,
        user_id: &str,
        team_id: &str,
    ) -> Result<Vec<CategoryBoards>, DomainError> {
        let conn = self.conn()?;
        let mut rows = conn
            .query(
                r#"
                SELECT id, name, type, user_id, team_id, create_at, update_at
                FROM categories
                WHERE user_id = ?1 AND team_id = ?2
                ORDER BY create_at, rowid
                "#,
                params![user_id, team_id],
            )
            .await
            .map_err(|e| DomainError::Store(e.to_string()))?;

        let mut categories = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DomainError::Store(e.to_string()))?
        {
            categories.push(Self::row_to_category(&row)?);
        }

        let mut result = Vec::with_capacity(categories.len());
        for category in categories {
            let board_ids = self.category_board_ids(&conn, &category.id).await?;
            result.push(CategoryBoards { category, board_ids });
        }
        Ok(result)
    }

    async fn create_category(&self, category: Category) -> Result<(), DomainError> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO categories (id, name, type, user_id, team_id, create_at, update_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                category.id.as_str(),
                category.name.as_str(),
                category.category_type.as_str(),
                category.user_id.as_str(),
                category.team_id.as_str(),
                category.create_at,
                category.update_at
            ],
        )
        .await
        .map_err(|e| DomainError::Store(e.to_string()))?;
        Ok(())
    }

    async fn get_category(&self, id: &str) -> Result<Category, DomainError> {
        let conn = self.conn()?;
        let mut rows = conn
            .query(
                r#"
                SELECT id, name, type, user_id, team_id, create_at, update_at
                FROM categories WHERE id = ?1
                "#,
                params![id],
            )
            .await
            .map_err(|e| DomainError::Store(e.to_string()))?;
        match rows
            .next()
            .await
            .map_err(|e| DomainError::Store(e.to_string()))?
        {
            Some(row) => Self::row_to_category(&row),
            None => Err(DomainError::CategoryNotFound(id.to_string())),
        }
    }

    async fn get_members_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<BoardMember>, DomainError> {
        let conn = self.conn()?;
        let mut rows = conn
            .query(
                "SELECT board_id, synthetic FROM board_members WHERE user_id = ?1 ORDER BY rowid",
                params![user_id],
            )
            .await
            .map_err(|e| DomainError::Store(e.to_string()))?;
        let mut members = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DomainError::Store(e.to_string()))?
        {
            let board_id: String = row.get(0).map_err(|e| DomainError::Store(e.to_string()))?;
            let synthetic: i64 = row.get(1).map_err(|e| DomainError::Store(e.to_string()))?;
            members.push(BoardMember {
                board_id,
                user_id: user_id.to_string(),
                kind: if synthetic != 0 {
                    MembershipKind::Synthetic
                } else {
                    MembershipKind::Explicit
                },
            });
        }
        Ok(members)
    }

    async fn add_update_category_board(
        &self,
        user_id: &str,
        board_id: &str,
        category_id: &str,
    ) -> Result<(), DomainError> {
        let conn = self.conn()?;
        // Upsert on (user_id, board_id): moving a board between categories is
        // an update of the same row. New boards go to the end of the category.
        conn.execute(
            r#"
            INSERT INTO category_boards (user_id, board_id, category_id, sort_order)
            VALUES (
                ?1, ?2, ?3,
                (SELECT COALESCE(MAX(sort_order) + 1, 0) FROM category_boards WHERE category_id = ?3)
            )
            ON CONFLICT (user_id, board_id) DO UPDATE SET
                category_id = excluded.category_id,
                sort_order = excluded.sort_order
            "#,
            params![user_id, board_id, category_id],
        )
        .await
        .map_err(|e| DomainError::Store(e.to_string()))?;
        Ok(())
    }

    async fn reorder_category_boards(
        &self,
        category_id: &str,
        board_order: &[String],
    ) -> Result<Vec<String>, DomainError> {
        let conn = self.conn()?;

        let mut rows = conn
            .query("SELECT id FROM categories WHERE id = ?1", params![category_id])
            .await
            .map_err(|e| DomainError::Store(e.to_string()))?;
        if rows
            .next()
            .await
            .map_err(|e| DomainError::Store(e.to_string()))?
            .is_none()
        {
            return Err(DomainError::CategoryNotFound(category_id.to_string()));
        }

        let tx = conn
            .transaction()
            .await
            .map_err(|e| DomainError::Store(e.to_string()))?;
        for (position, board_id) in board_order.iter().enumerate() {
            tx.execute(
                r#"
                UPDATE category_boards SET sort_order = ?1
                WHERE category_id = ?2 AND board_id = ?3
                "#,
                params![position as i64, category_id, board_id.as_str()],
            )
            .await
            .map_err(|e| DomainError::Store(e.to_string()))?;
        }
        tx.commit()
            .await
            .map_err(|e| DomainError::Store(e.to_string()))?;

        self.category_board_ids(&conn, category_id).await
    }
}
