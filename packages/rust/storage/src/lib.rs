//! libSQL storage layer (local file).
//!
//! The [`Storage`] struct wraps a libSQL database holding users, chats, chat
//! messages, and generated blogs.
//!
//! **Access rules:**
//! - `generate` and `chats delete`: read-write via [`Storage::open`]
//! - listing commands: read-only via [`Storage::open_readonly`]

mod migrations;

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use libsql::{Connection, Database, params};
use topicpress_shared::{
    BlogRecord, ChatRecord, MessageRecord, MessageRole, Result, TopicPressError, UserRecord,
    chat_title,
};
use uuid::Uuid;

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
    readonly: bool,
}

fn storage_err(e: libsql::Error) -> TopicPressError {
    TopicPressError::Storage(e.to_string())
}

/// Fixed-width RFC 3339 so stored timestamps sort lexically.
fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn new_id() -> String {
    Uuid::now_v7().to_string()
}

impl Storage {
    /// Open or create a database at `path` in read-write mode.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| TopicPressError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(storage_err)?;
        let conn = db.connect().map_err(storage_err)?;

        let storage = Self {
            db,
            conn,
            readonly: false,
        };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Open an existing database at `path` in read-only mode.
    pub async fn open_readonly(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(TopicPressError::not_found(format!(
                "database {}",
                path.display()
            )));
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(storage_err)?;
        let conn = db.connect().map_err(storage_err)?;

        Ok(Self {
            db,
            conn,
            readonly: true,
        })
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn
                    .execute_batch(migration.sql)
                    .await
                    .map_err(|e| {
                        TopicPressError::Storage(format!(
                            "migration v{} failed: {e}",
                            migration.version
                        ))
                    })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    /// Ensure we're in read-write mode before writing.
    fn check_writable(&self) -> Result<()> {
        if self.readonly {
            return Err(TopicPressError::Storage(
                "database is opened in read-only mode".into(),
            ));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Users
    // -----------------------------------------------------------------------

    /// Look up a user by name, creating it on first use.
    pub async fn get_or_create_user(&self, username: &str) -> Result<UserRecord> {
        let username = username.trim();
        if username.is_empty() {
            return Err(TopicPressError::validation("username must not be empty"));
        }

        if let Some(user) = self.find_user(username).await? {
            return Ok(user);
        }

        self.check_writable()?;
        self.conn
            .execute(
                "INSERT OR IGNORE INTO users (id, username, created_at) VALUES (?1, ?2, ?3)",
                params![new_id(), username, now_timestamp()],
            )
            .await
            .map_err(storage_err)?;
        tracing::debug!(username, "created user");

        self.find_user(username)
            .await?
            .ok_or_else(|| TopicPressError::not_found(format!("user {username}")))
    }

    /// Find a user by name.
    pub async fn find_user(&self, username: &str) -> Result<Option<UserRecord>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, username, created_at FROM users WHERE username = ?1",
                params![username],
            )
            .await
            .map_err(storage_err)?;

        match rows.next().await.map_err(storage_err)? {
            Some(row) => Ok(Some(UserRecord {
                id: row.get::<String>(0).map_err(storage_err)?,
                username: row.get::<String>(1).map_err(storage_err)?,
                created_at: parse_timestamp(&row, 2)?,
            })),
            None => Ok(None),
        }
    }

    // -----------------------------------------------------------------------
    // Chats and messages
    // -----------------------------------------------------------------------

    /// Start a chat. The title is cut to the chat title length.
    pub async fn create_chat(&self, user_id: &str, title: &str) -> Result<ChatRecord> {
        self.check_writable()?;
        let id = new_id();
        let title = chat_title(title);
        let now = now_timestamp();

        self.conn
            .execute(
                "INSERT INTO chats (id, user_id, title, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id.as_str(), user_id, title.as_str(), now.as_str(), now.as_str()],
            )
            .await
            .map_err(storage_err)?;

        self.get_chat(&id)
            .await?
            .ok_or_else(|| TopicPressError::not_found(format!("chat {id}")))
    }

    /// Get a chat by ID.
    pub async fn get_chat(&self, chat_id: &str) -> Result<Option<ChatRecord>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, user_id, title, created_at, updated_at FROM chats WHERE id = ?1",
                params![chat_id],
            )
            .await
            .map_err(storage_err)?;

        match rows.next().await.map_err(storage_err)? {
            Some(row) => Ok(Some(row_to_chat(&row)?)),
            None => Ok(None),
        }
    }

    /// List a user's chats, most recently active first.
    pub async fn list_chats(&self, user_id: &str) -> Result<Vec<ChatRecord>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, user_id, title, created_at, updated_at FROM chats
                 WHERE user_id = ?1
                 ORDER BY updated_at DESC, id DESC",
                params![user_id],
            )
            .await
            .map_err(storage_err)?;

        let mut chats = Vec::new();
        while let Some(row) = rows.next().await.map_err(storage_err)? {
            chats.push(row_to_chat(&row)?);
        }
        Ok(chats)
    }

    /// Append a message to a chat and bump the chat's `updated_at`.
    pub async fn add_message(
        &self,
        chat_id: &str,
        role: MessageRole,
        content: &str,
    ) -> Result<MessageRecord> {
        self.check_writable()?;
        let now = now_timestamp();

        let touched = self
            .conn
            .execute(
                "UPDATE chats SET updated_at = ?1 WHERE id = ?2",
                params![now.as_str(), chat_id],
            )
            .await
            .map_err(storage_err)?;
        if touched == 0 {
            return Err(TopicPressError::not_found(format!("chat {chat_id}")));
        }

        let id = new_id();
        self.conn
            .execute(
                "INSERT INTO messages (id, chat_id, role, content, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id.as_str(), chat_id, role.as_str(), content, now.as_str()],
            )
            .await
            .map_err(storage_err)?;

        Ok(MessageRecord {
            id,
            chat_id: chat_id.to_string(),
            role,
            content: content.to_string(),
            created_at: parse_rfc3339(&now)?,
        })
    }

    /// Messages of a chat, oldest first.
    pub async fn get_chat_messages(&self, chat_id: &str) -> Result<Vec<MessageRecord>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, chat_id, role, content, created_at FROM messages
                 WHERE chat_id = ?1
                 ORDER BY created_at ASC, id ASC",
                params![chat_id],
            )
            .await
            .map_err(storage_err)?;

        let mut messages = Vec::new();
        while let Some(row) = rows.next().await.map_err(storage_err)? {
            let role: String = row.get(2).map_err(storage_err)?;
            messages.push(MessageRecord {
                id: row.get::<String>(0).map_err(storage_err)?,
                chat_id: row.get::<String>(1).map_err(storage_err)?,
                role: role.parse().map_err(TopicPressError::Storage)?,
                content: row.get::<String>(3).map_err(storage_err)?,
                created_at: parse_timestamp(&row, 4)?,
            });
        }
        Ok(messages)
    }

    /// Delete a chat and its messages. Blogs generated in the chat are kept
    /// with their `chat_id` cleared.
    pub async fn delete_chat(&self, chat_id: &str) -> Result<()> {
        self.check_writable()?;
        if self.get_chat(chat_id).await?.is_none() {
            return Err(TopicPressError::not_found(format!("chat {chat_id}")));
        }

        let tx = self.conn.transaction().await.map_err(storage_err)?;
        tx.execute(
            "UPDATE blogs SET chat_id = NULL WHERE chat_id = ?1",
            params![chat_id],
        )
        .await
        .map_err(storage_err)?;
        let messages = tx
            .execute("DELETE FROM messages WHERE chat_id = ?1", params![chat_id])
            .await
            .map_err(storage_err)?;
        tx.execute("DELETE FROM chats WHERE id = ?1", params![chat_id])
            .await
            .map_err(storage_err)?;
        tx.commit().await.map_err(storage_err)?;

        tracing::info!(chat_id, messages, "deleted chat");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Blogs
    // -----------------------------------------------------------------------

    /// Save a generated blog.
    pub async fn insert_blog(
        &self,
        user_id: &str,
        chat_id: Option<&str>,
        topic: &str,
        content: &str,
    ) -> Result<BlogRecord> {
        self.check_writable()?;
        let id = new_id();
        let now = now_timestamp();

        self.conn
            .execute(
                "INSERT INTO blogs (id, user_id, chat_id, topic, content, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![id.as_str(), user_id, chat_id, topic, content, now.as_str()],
            )
            .await
            .map_err(storage_err)?;

        Ok(BlogRecord {
            id,
            user_id: user_id.to_string(),
            chat_id: chat_id.map(str::to_string),
            topic: topic.to_string(),
            content: content.to_string(),
            created_at: parse_rfc3339(&now)?,
        })
    }

    /// A user's blogs, newest first.
    pub async fn list_blogs(&self, user_id: &str) -> Result<Vec<BlogRecord>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, user_id, chat_id, topic, content, created_at FROM blogs
                 WHERE user_id = ?1
                 ORDER BY created_at DESC, id DESC",
                params![user_id],
            )
            .await
            .map_err(storage_err)?;

        let mut blogs = Vec::new();
        while let Some(row) = rows.next().await.map_err(storage_err)? {
            blogs.push(row_to_blog(&row)?);
        }
        Ok(blogs)
    }

    /// Get a blog by ID.
    pub async fn get_blog(&self, blog_id: &str) -> Result<Option<BlogRecord>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, user_id, chat_id, topic, content, created_at FROM blogs
                 WHERE id = ?1",
                params![blog_id],
            )
            .await
            .map_err(storage_err)?;

        match rows.next().await.map_err(storage_err)? {
            Some(row) => Ok(Some(row_to_blog(&row)?)),
            None => Ok(None),
        }
    }
}

fn parse_rfc3339(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| TopicPressError::Storage(format!("invalid date: {e}")))
}

fn parse_timestamp(row: &libsql::Row, idx: i32) -> Result<DateTime<Utc>> {
    let s: String = row.get(idx).map_err(storage_err)?;
    parse_rfc3339(&s)
}

/// Convert a database row to a [`ChatRecord`].
fn row_to_chat(row: &libsql::Row) -> Result<ChatRecord> {
    Ok(ChatRecord {
        id: row.get::<String>(0).map_err(storage_err)?,
        user_id: row.get::<String>(1).map_err(storage_err)?,
        title: row.get::<String>(2).map_err(storage_err)?,
        created_at: parse_timestamp(row, 3)?,
        updated_at: parse_timestamp(row, 4)?,
    })
}

/// Convert a database row to a [`BlogRecord`].
fn row_to_blog(row: &libsql::Row) -> Result<BlogRecord> {
    Ok(BlogRecord {
        id: row.get::<String>(0).map_err(storage_err)?,
        user_id: row.get::<String>(1).map_err(storage_err)?,
        chat_id: row.get::<Option<String>>(2).map_err(storage_err)?,
        topic: row.get::<String>(3).map_err(storage_err)?,
        content: row.get::<String>(4).map_err(storage_err)?,
        created_at: parse_timestamp(row, 5)?,
    })
}
