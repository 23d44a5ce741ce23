use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use remora::handlers::{NewTodoItem, TodoItem, TodoStore};

/// In-memory [`TodoStore`] fake with sequential ids.
#[derive(Default)]
pub struct InMemoryTodoStore {
    items: Mutex<HashMap<String, TodoItem>>,
    next_id: AtomicU64,
}

impl InMemoryTodoStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an item and return it.
    pub fn insert(&self, title: &str, owner_id: &str, status: &str) -> TodoItem {
        let id = format!("todo-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        let item = TodoItem {
            id: id.clone(),
            title: title.to_string(),
            description: String::new(),
            owner_id: owner_id.to_string(),
            status: status.to_string(),
        };
        self.items.lock().insert(id, item.clone());
        item
    }

    /// All stored items, in no particular order.
    pub fn items(&self) -> Vec<TodoItem> {
        self.items.lock().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }
}

#[async_trait]
impl TodoStore for InMemoryTodoStore {
    async fn find_todo(&self, id: &str) -> anyhow::Result<Option<TodoItem>> {
        Ok(self.items.lock().get(id).cloned())
    }

    async fn create_todo(&self, item: NewTodoItem) -> anyhow::Result<TodoItem> {
        let id = format!("todo-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        let created = TodoItem {
            id: id.clone(),
            title: item.title,
            description: item.description,
            owner_id: item.owner_id,
            status: item.status,
        };
        self.items.lock().insert(id, created.clone());
        Ok(created)
    }
}
