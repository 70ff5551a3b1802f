//! Task data: categories of checkable items, persisted as JSON.
//!
//! The store keeps categories and their tasks ordered by explicit `order`
//! fields so drag-reordering survives reload. Every mutation persists
//! immediately; persistence failures are logged and the in-memory state
//! stays authoritative for the session.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::content::{ContentSlots, ContentSource};
use crate::error::{NotchError, Result, ResultExt};
use crate::logging;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryColor {
    Blue,
    Purple,
    Pink,
    Red,
    Orange,
    Yellow,
    Green,
    Teal,
    Indigo,
    Mint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskItem {
    pub id: Uuid,
    pub title: String,
    #[serde(rename = "isCompleted")]
    pub is_completed: bool,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub order: usize,
}

impl TaskItem {
    pub fn new(title: impl Into<String>, order: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            is_completed: false,
            created_at: Utc::now(),
            order,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskCategory {
    pub id: Uuid,
    pub title: String,
    #[serde(rename = "iconName")]
    pub icon_name: String,
    pub color: CategoryColor,
    pub order: usize,
    #[serde(default)]
    pub tasks: Vec<TaskItem>,
}

impl TaskCategory {
    pub fn new(title: impl Into<String>, color: CategoryColor, order: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            icon_name: "list.bullet".to_string(),
            color,
            order,
            tasks: Vec::new(),
        }
    }

    pub fn incomplete_tasks(&self) -> impl Iterator<Item = &TaskItem> {
        self.tasks.iter().filter(|t| !t.is_completed)
    }

    pub fn completed_tasks(&self) -> impl Iterator<Item = &TaskItem> {
        self.tasks.iter().filter(|t| t.is_completed)
    }
}

/// On-disk document shape.
#[derive(Debug, Default, Serialize, Deserialize)]
struct TaskDocument {
    #[serde(default)]
    categories: Vec<TaskCategory>,
    #[serde(default, rename = "hideCompleted")]
    hide_completed: bool,
}

pub struct TaskStore {
    path: PathBuf,
    categories: Vec<TaskCategory>,
    hide_completed: bool,
}

/// Default store path (~/.notch-tasks/tasks.json)
pub fn store_path() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".notch-tasks").join("tasks.json"))
        .unwrap_or_else(|| std::env::temp_dir().join("notch-tasks.json"))
}

impl TaskStore {
    /// Load from `path`, normalizing order fields. A missing file is an
    /// empty store; a corrupt one is logged and treated as empty rather
    /// than blocking startup.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let document = read_document(&path).warn_on_err().unwrap_or_default();
        let mut store = Self {
            path,
            categories: document.categories,
            hide_completed: document.hide_completed,
        };
        store.normalize_orders();
        // Persist the normalized shape so older files round up to it.
        store.save().log_err();
        store
    }

    pub fn categories(&self) -> &[TaskCategory] {
        &self.categories
    }

    pub fn hide_completed(&self) -> bool {
        self.hide_completed
    }

    pub fn set_hide_completed(&mut self, hide: bool) {
        self.hide_completed = hide;
        self.save().log_err();
    }

    // --- category operations ---

    pub fn add_category(
        &mut self,
        title: impl Into<String>,
        color: CategoryColor,
    ) -> Uuid {
        let category = TaskCategory::new(title, color, self.categories.len());
        let id = category.id;
        self.categories.push(category);
        self.save().log_err();
        id
    }

    pub fn update_category(
        &mut self,
        id: Uuid,
        title: Option<&str>,
        icon_name: Option<&str>,
        color: Option<CategoryColor>,
    ) {
        let Some(category) = self.categories.iter_mut().find(|c| c.id == id) else {
            return;
        };
        if let Some(title) = title {
            category.title = title.to_string();
        }
        if let Some(icon) = icon_name {
            category.icon_name = icon.to_string();
        }
        if let Some(color) = color {
            category.color = color;
        }
        self.save().log_err();
    }

    pub fn delete_category(&mut self, id: Uuid) {
        self.categories.retain(|c| c.id != id);
        renumber_categories(&mut self.categories);
        self.save().log_err();
    }

    /// Move the category at `from` to sit at `to`, then renumber.
    pub fn reorder_categories(&mut self, from: usize, to: usize) {
        if from >= self.categories.len() || to > self.categories.len() {
            return;
        }
        let category = self.categories.remove(from);
        let to = to.min(self.categories.len());
        self.categories.insert(to, category);
        renumber_categories(&mut self.categories);
        self.save().log_err();
    }

    // --- task operations ---

    pub fn add_task(&mut self, category_id: Uuid, title: impl Into<String>) -> Option<Uuid> {
        let category = self.categories.iter_mut().find(|c| c.id == category_id)?;
        let task = TaskItem::new(title, category.tasks.len());
        let id = task.id;
        category.tasks.push(task);
        self.save().log_err();
        Some(id)
    }

    pub fn update_task(
        &mut self,
        category_id: Uuid,
        task_id: Uuid,
        title: Option<&str>,
        is_completed: Option<bool>,
    ) {
        let Some(task) = self.task_mut(category_id, task_id) else {
            return;
        };
        if let Some(title) = title {
            task.title = title.to_string();
        }
        if let Some(done) = is_completed {
            task.is_completed = done;
        }
        self.save().log_err();
    }

    pub fn toggle_task(&mut self, category_id: Uuid, task_id: Uuid) {
        if let Some(task) = self.task_mut(category_id, task_id) {
            task.is_completed = !task.is_completed;
            self.save().log_err();
        }
    }

    pub fn delete_task(&mut self, category_id: Uuid, task_id: Uuid) {
        let Some(category) = self.categories.iter_mut().find(|c| c.id == category_id) else {
            return;
        };
        category.tasks.retain(|t| t.id != task_id);
        renumber_tasks(&mut category.tasks);
        self.save().log_err();
    }

    pub fn reorder_tasks(&mut self, category_id: Uuid, from: usize, to: usize) {
        let Some(category) = self.categories.iter_mut().find(|c| c.id == category_id) else {
            return;
        };
        if from >= category.tasks.len() || to > category.tasks.len() {
            return;
        }
        let task = category.tasks.remove(from);
        let to = to.min(category.tasks.len());
        category.tasks.insert(to, task);
        renumber_tasks(&mut category.tasks);
        self.save().log_err();
    }

    fn task_mut(&mut self, category_id: Uuid, task_id: Uuid) -> Option<&mut TaskItem> {
        self.categories
            .iter_mut()
            .find(|c| c.id == category_id)?
            .tasks
            .iter_mut()
            .find(|t| t.id == task_id)
    }

    // --- counts ---

    pub fn total_tasks(&self) -> usize {
        self.categories.iter().map(|c| c.tasks.len()).sum()
    }

    pub fn total_incomplete_tasks(&self) -> usize {
        self.categories
            .iter()
            .map(|c| c.incomplete_tasks().count())
            .sum()
    }

    pub fn total_completed_tasks(&self) -> usize {
        self.categories
            .iter()
            .map(|c| c.completed_tasks().count())
            .sum()
    }

    fn normalize_orders(&mut self) {
        self.categories.sort_by_key(|c| c.order);
        renumber_categories(&mut self.categories);
        for category in &mut self.categories {
            // Older files carried tasks without order fields; backfill
            // from position before sorting.
            for (index, task) in category.tasks.iter_mut().enumerate() {
                if task.order == 0 && index > 0 {
                    task.order = index;
                }
            }
            category.tasks.sort_by_key(|t| t.order);
        }
    }

    fn save(&self) -> Result<()> {
        let document = TaskDocument {
            categories: self.categories.clone(),
            hide_completed: self.hide_completed,
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| NotchError::TaskPersist {
                path: self.path.display().to_string(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(&document)?;
        std::fs::write(&self.path, json).map_err(|source| NotchError::TaskPersist {
            path: self.path.display().to_string(),
            source,
        })?;
        logging::log_debug("TASKS", "store saved");
        Ok(())
    }
}

fn renumber_categories(categories: &mut [TaskCategory]) {
    for (index, category) in categories.iter_mut().enumerate() {
        category.order = index;
    }
}

fn renumber_tasks(tasks: &mut [TaskItem]) {
    for (index, task) in tasks.iter_mut().enumerate() {
        task.order = index;
    }
}

fn read_document(path: &Path) -> Result<TaskDocument> {
    if !path.exists() {
        return Ok(TaskDocument::default());
    }
    let contents = std::fs::read_to_string(path).map_err(|source| NotchError::TaskPersist {
        path: path.display().to_string(),
        source,
    })?;
    Ok(serde_json::from_str(&contents)?)
}

impl ContentSource for TaskStore {
    /// Panel content: expanded gets one line per category with its open
    /// tasks, compact gets the date plus the open-task count.
    fn content_slots(&self) -> ContentSlots {
        let incomplete = self.total_incomplete_tasks();

        let mut lines = Vec::new();
        for category in &self.categories {
            let visible: Vec<&TaskItem> = if self.hide_completed {
                category.incomplete_tasks().collect()
            } else {
                category.tasks.iter().collect()
            };
            if visible.is_empty() {
                continue;
            }
            lines.push(format!(
                "{} ({}/{})",
                category.title,
                category.incomplete_tasks().count(),
                category.tasks.len()
            ));
            for task in visible {
                let mark = if task.is_completed { "x" } else { " " };
                lines.push(format!("  [{}] {}", mark, task.title));
            }
        }
        let expanded = if lines.is_empty() {
            Some("No tasks yet".to_string())
        } else {
            Some(lines.join("\n"))
        };

        ContentSlots {
            expanded,
            compact_leading: Some(Utc::now().format("%a · %b %-d").to_string()),
            compact_trailing: (incomplete > 0).then(|| incomplete.to_string()),
            badge_count: incomplete,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (TaskStore, PathBuf) {
        let path = std::env::temp_dir()
            .join("notch-tasks-store-test")
            .join(format!("{}.json", Uuid::new_v4()));
        (TaskStore::load(path.clone()), path)
    }

    #[test]
    fn missing_file_loads_empty() {
        let (store, path) = temp_store();
        assert!(store.categories().is_empty());
        assert_eq!(store.total_tasks(), 0);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn crud_round_trips_through_disk() {
        let (mut store, path) = temp_store();
        let work = store.add_category("Work", CategoryColor::Blue);
        let t1 = store.add_task(work, "write report").unwrap();
        store.add_task(work, "send invoice").unwrap();
        store.toggle_task(work, t1);

        let reloaded = TaskStore::load(path.clone());
        assert_eq!(reloaded.categories().len(), 1);
        assert_eq!(reloaded.total_tasks(), 2);
        assert_eq!(reloaded.total_completed_tasks(), 1);
        assert_eq!(reloaded.categories()[0].tasks[0].title, "write report");
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn delete_renumbers_orders() {
        let (mut store, path) = temp_store();
        let a = store.add_category("A", CategoryColor::Red);
        let b = store.add_category("B", CategoryColor::Green);
        let c = store.add_category("C", CategoryColor::Teal);
        assert_eq!(store.categories()[2].order, 2);

        store.delete_category(b);
        assert_eq!(store.categories().len(), 2);
        assert_eq!(store.categories()[0].id, a);
        assert_eq!(store.categories()[1].id, c);
        assert_eq!(store.categories()[1].order, 1);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn reorder_categories_moves_and_renumbers() {
        let (mut store, path) = temp_store();
        let a = store.add_category("A", CategoryColor::Red);
        let b = store.add_category("B", CategoryColor::Green);
        store.add_category("C", CategoryColor::Teal);

        store.reorder_categories(0, 2);
        let ids: Vec<Uuid> = store.categories().iter().map(|c| c.id).collect();
        assert_eq!(ids[0], b);
        assert_eq!(ids[2], a);
        let orders: Vec<usize> = store.categories().iter().map(|c| c.order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn reorder_moves_and_renumbers() {
        let (mut store, path) = temp_store();
        let cat = store.add_category("List", CategoryColor::Purple);
        store.add_task(cat, "one");
        store.add_task(cat, "two");
        store.add_task(cat, "three");

        store.reorder_tasks(cat, 2, 0);
        let titles: Vec<&str> = store.categories()[0]
            .tasks
            .iter()
            .map(|t| t.title.as_str())
            .collect();
        assert_eq!(titles, vec!["three", "one", "two"]);
        let orders: Vec<usize> = store.categories()[0].tasks.iter().map(|t| t.order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn out_of_range_reorder_is_ignored() {
        let (mut store, path) = temp_store();
        let cat = store.add_category("List", CategoryColor::Mint);
        store.add_task(cat, "only");
        store.reorder_tasks(cat, 5, 0);
        assert_eq!(store.categories()[0].tasks.len(), 1);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn load_backfills_missing_task_orders() {
        let dir = std::env::temp_dir().join("notch-tasks-store-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(format!("{}.json", Uuid::new_v4()));
        // Tasks serialized without order fields, as older builds wrote them.
        let json = r#"{
            "categories": [{
                "id": "6f2c1f6e-74a5-4f3e-9a3d-5b9f0a1c2d3e",
                "title": "Old",
                "iconName": "list.bullet",
                "color": "blue",
                "order": 0,
                "tasks": [
                    {"id": "11111111-1111-1111-1111-111111111111", "title": "first", "isCompleted": false, "createdAt": "2025-01-01T00:00:00Z"},
                    {"id": "22222222-2222-2222-2222-222222222222", "title": "second", "isCompleted": false, "createdAt": "2025-01-01T00:00:00Z"}
                ]
            }]
        }"#;
        std::fs::write(&path, json).unwrap();

        let store = TaskStore::load(path.clone());
        let orders: Vec<usize> = store.categories()[0].tasks.iter().map(|t| t.order).collect();
        assert_eq!(orders, vec![0, 1]);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn corrupt_file_loads_empty() {
        let dir = std::env::temp_dir().join("notch-tasks-store-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(format!("{}.json", Uuid::new_v4()));
        std::fs::write(&path, "]]not json[[").unwrap();
        let store = TaskStore::load(path.clone());
        assert!(store.categories().is_empty());
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn content_slots_reflect_counts() {
        let (mut store, path) = temp_store();
        let cat = store.add_category("Inbox", CategoryColor::Blue);
        let t1 = store.add_task(cat, "open me").unwrap();
        store.add_task(cat, "and me");
        store.toggle_task(cat, t1);

        let slots = store.content_slots();
        assert_eq!(slots.badge_count, 1);
        assert_eq!(slots.compact_trailing.as_deref(), Some("1"));
        let expanded = slots.expanded.unwrap();
        assert!(expanded.contains("Inbox (1/2)"));
        assert!(expanded.contains("[x] open me"));

        // Hiding completed drops the checked line.
        store.set_hide_completed(true);
        let expanded = store.content_slots().expanded.unwrap();
        assert!(!expanded.contains("open me"));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn empty_store_still_offers_expanded_content() {
        let (store, path) = temp_store();
        let slots = store.content_slots();
        assert_eq!(slots.expanded.as_deref(), Some("No tasks yet"));
        assert_eq!(slots.badge_count, 0);
        assert!(slots.compact_trailing.is_none());
        std::fs::remove_file(&path).ok();
    }
}
