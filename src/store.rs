use crate::models::{
    Flash, FlashKind, ListId, SessionData, StoreError, TitleError, Todo, TodoId, TodoList,
    MAX_TITLE_CHARS,
};
use indexmap::IndexMap;
use std::hash::Hash;

/// Items that can be put in a [`sorted_view`].
pub trait Titled {
    type Id: Clone + Eq + Hash;

    fn id(&self) -> &Self::Id;
    fn title(&self) -> &str;
}

impl Titled for TodoList {
    type Id = ListId;

    fn id(&self) -> &ListId {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }
}

impl Titled for Todo {
    type Id = TodoId;

    fn id(&self) -> &TodoId {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }
}

fn title_length_ok(title: &str) -> bool {
    (1..=MAX_TITLE_CHARS).contains(&title.chars().count())
}

/// Uniqueness is an exact, case-sensitive comparison.
pub fn validate_list_title(
    title: &str,
    lists: &IndexMap<ListId, TodoList>,
) -> Result<(), TitleError> {
    if !title_length_ok(title) {
        return Err(TitleError::ListTitleLength);
    }
    if lists.values().any(|list| list.title == title) {
        return Err(TitleError::DuplicateListTitle);
    }
    Ok(())
}

pub fn validate_todo_title(title: &str) -> Result<(), TitleError> {
    if !title_length_ok(title) {
        return Err(TitleError::TodoTitleLength);
    }
    Ok(())
}

/// Orders items with the not-done ones first, each group sorted by
/// case-folded title (so "Straße" sorts as "strasse"). Items with equal
/// folded titles keep their incoming order.
pub fn sorted_view<'a, T, I, F>(items: I, is_done: F) -> IndexMap<T::Id, T>
where
    T: Titled + Clone + 'a,
    I: IntoIterator<Item = &'a T>,
    F: Fn(&T) -> bool,
{
    let mut sorted: Vec<&T> = items.into_iter().collect();
    sorted.sort_by_cached_key(|item| caseless::default_case_fold_str(item.title()));

    let (not_done, done): (Vec<&T>, Vec<&T>) =
        sorted.into_iter().partition(|item| !is_done(*item));

    not_done
        .into_iter()
        .chain(done)
        .map(|item| (item.id().clone(), item.clone()))
        .collect()
}

/// One session's collection of lists.
///
/// Every mutating operation marks the store as modified; the session layer
/// reads [`TodoStore::is_modified`] after a request to decide whether the
/// data has to be written back.
#[derive(Debug, Default)]
pub struct TodoStore {
    data: SessionData,
    modified: bool,
}

impl TodoStore {
    pub fn new(data: SessionData) -> Self {
        Self {
            data,
            modified: false,
        }
    }

    pub fn lists(&self) -> &IndexMap<ListId, TodoList> {
        &self.data.lists
    }

    pub fn data(&self) -> &SessionData {
        &self.data
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn into_data(self) -> SessionData {
        self.data
    }

    pub fn validate_list_title(&self, title: &str) -> Result<(), TitleError> {
        validate_list_title(title, &self.data.lists)
    }

    /// Lists ordered for display: lists with open todos first.
    pub fn sorted_lists(&self) -> IndexMap<ListId, TodoList> {
        sorted_view(self.data.lists.values(), TodoList::is_completed)
    }

    pub fn create_list(&mut self, title: String) -> &TodoList {
        let list = TodoList::new(title);
        tracing::debug!(list_id = %list.id, "creating list");
        self.insert_list(list)
    }

    fn insert_list(&mut self, list: TodoList) -> &TodoList {
        let id = list.id.clone();
        self.modified = true;
        self.data.lists.insert(id.clone(), list);
        &self.data.lists[&id]
    }

    pub fn find_list(&self, id: &ListId) -> Result<&TodoList, StoreError> {
        let list = self
            .data
            .lists
            .get(id)
            .ok_or_else(|| StoreError::ListNotFound(id.clone()))?;
        if list.id != *id {
            return Err(StoreError::ListIdMismatch {
                key: id.clone(),
                found: list.id.clone(),
            });
        }
        Ok(list)
    }

    // Callers that mutate through the returned list must set `modified`.
    fn find_list_mut(&mut self, id: &ListId) -> Result<&mut TodoList, StoreError> {
        self.find_list(id)?;
        self.data
            .lists
            .get_mut(id)
            .ok_or_else(|| StoreError::ListNotFound(id.clone()))
    }

    pub fn rename_list(&mut self, id: &ListId, new_title: String) -> Result<(), StoreError> {
        let list = self.find_list_mut(id)?;
        list.title = new_title;
        self.modified = true;
        Ok(())
    }

    pub fn delete_list(&mut self, id: &ListId) -> Result<TodoList, StoreError> {
        self.find_list(id)?;
        let list = self
            .data
            .lists
            .shift_remove(id)
            .ok_or_else(|| StoreError::ListNotFound(id.clone()))?;
        tracing::debug!(list_id = %id, "deleted list");
        self.modified = true;
        Ok(list)
    }

    pub fn create_todo(&mut self, list_id: &ListId, title: String) -> Result<&Todo, StoreError> {
        self.find_list(list_id)?;
        let todo = Todo::new(title);
        let id = todo.id.clone();
        tracing::debug!(list_id = %list_id, todo_id = %id, "creating todo");
        self.modified = true;
        let list = self.find_list_mut(list_id)?;
        list.todos.insert(id.clone(), todo);
        Ok(&list.todos[&id])
    }

    pub fn find_todo(&self, list_id: &ListId, todo_id: &TodoId) -> Result<&Todo, StoreError> {
        self.find_list(list_id)?
            .todos
            .get(todo_id)
            .ok_or_else(|| StoreError::TodoNotFound(todo_id.clone()))
    }

    pub fn set_todo_completed(
        &mut self,
        list_id: &ListId,
        todo_id: &TodoId,
        completed: bool,
    ) -> Result<(), StoreError> {
        let todo = self
            .find_list_mut(list_id)?
            .todos
            .get_mut(todo_id)
            .ok_or_else(|| StoreError::TodoNotFound(todo_id.clone()))?;
        todo.completed = completed;
        self.modified = true;
        Ok(())
    }

    pub fn set_all_todos_completed(
        &mut self,
        list_id: &ListId,
        completed: bool,
    ) -> Result<(), StoreError> {
        let list = self.find_list_mut(list_id)?;
        for todo in list.todos.values_mut() {
            todo.completed = completed;
        }
        self.modified = true;
        Ok(())
    }

    pub fn delete_todo(&mut self, list_id: &ListId, todo_id: &TodoId) -> Result<Todo, StoreError> {
        let todo = self
            .find_list_mut(list_id)?
            .todos
            .shift_remove(todo_id)
            .ok_or_else(|| StoreError::TodoNotFound(todo_id.clone()))?;
        self.modified = true;
        Ok(todo)
    }

    pub fn flash(&mut self, kind: FlashKind, message: impl Into<String>) {
        self.data.flashes.push(Flash {
            kind,
            message: message.into(),
        });
        self.modified = true;
    }

    /// Drains pending flashes so each one is shown exactly once.
    pub fn take_flashes(&mut self) -> Vec<Flash> {
        if self.data.flashes.is_empty() {
            return Vec::new();
        }
        self.modified = true;
        std::mem::take(&mut self.data.flashes)
    }
}
