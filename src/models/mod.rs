use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Longest title (in characters) accepted for a list or a todo.
pub const MAX_TITLE_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListId(String);

impl ListId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ListId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for ListId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for ListId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(String);

impl TodoId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for TodoId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for TodoId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Todo {
    pub id: TodoId,
    pub title: String,
    pub completed: bool,
}

impl Todo {
    pub fn new(title: String) -> Self {
        Self {
            id: TodoId::generate(),
            title,
            completed: false,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TodoList {
    pub id: ListId,
    pub title: String,
    #[serde(default)]
    pub todos: IndexMap<TodoId, Todo>,
}

impl TodoList {
    pub fn new(title: String) -> Self {
        Self {
            id: ListId::generate(),
            title,
            todos: IndexMap::new(),
        }
    }

    /// Number of todos that are not completed yet.
    pub fn count_incomplete(&self) -> usize {
        self.todos.values().filter(|todo| !todo.completed).count()
    }

    /// A list with no todos counts as completed.
    pub fn is_completed(&self) -> bool {
        self.count_incomplete() == 0
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Error,
}

impl FlashKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FlashKind::Success => "success",
            FlashKind::Error => "error",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

/// Everything one session owns: its lists and any pending flash messages.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SessionData {
    #[serde(default)]
    pub lists: IndexMap<ListId, TodoList>,
    #[serde(default)]
    pub flashes: Vec<Flash>,
    pub updated_at: DateTime<Utc>,
}

impl SessionData {
    pub fn new() -> Self {
        Self {
            lists: IndexMap::new(),
            flashes: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty() && self.flashes.is_empty()
    }

    /// Checks that every list and todo is stored under its own id.
    pub fn validate(&self) -> Result<(), StoreError> {
        for (key, list) in &self.lists {
            if *key != list.id {
                return Err(StoreError::ListIdMismatch {
                    key: key.clone(),
                    found: list.id.clone(),
                });
            }
            for (todo_key, todo) in &list.todos {
                if *todo_key != todo.id {
                    return Err(StoreError::TodoIdMismatch {
                        key: todo_key.clone(),
                        found: todo.id.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

impl Default for SessionData {
    fn default() -> Self {
        Self::new()
    }
}

/// User input that fails the title rules. Rendered back to the user as-is.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TitleError {
    #[error("The title must be between 1 and 100 chars.")]
    ListTitleLength,
    #[error("The title must be unique.")]
    DuplicateListTitle,
    #[error("The Todo must be between 1 and 100 chars.")]
    TodoTitleLength,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("List could not be found")]
    ListNotFound(ListId),
    #[error("Todo could not be found")]
    TodoNotFound(TodoId),
    #[error("List id {found} does not match registered key {key}")]
    ListIdMismatch { key: ListId, found: ListId },
    #[error("Todo id {found} does not match registered key {key}")]
    TodoIdMismatch { key: TodoId, found: TodoId },
}
