//! In-memory record collections backing the sample resources and tools

use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;

pub const USER_ROLES: &[&str] = &["admin", "user", "moderator"];
pub const PROJECT_STATUSES: &[&str] = &["planning", "active", "archived"];

pub trait Record: Clone + Send + Sync {
    fn id(&self) -> u64;
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub role: String,
    pub created: String,
}

impl Record for User {
    fn id(&self) -> u64 {
        self.id
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub owner_id: u64,
    pub status: String,
    pub created: String,
}

impl Record for Project {
    fn id(&self) -> u64 {
        self.id
    }
}

struct Collection<T> {
    records: Vec<T>,
    next_id: u64,
}

/// A collection that many readers can list while writers append one at a time.
///
/// Id assignment and the append happen under the same write lock, so a reader
/// sees either the whole new record or nothing.
pub struct RecordStore<T> {
    inner: RwLock<Collection<T>>,
}

impl<T: Record> RecordStore<T> {
    pub fn new(seed: Vec<T>) -> Self {
        let next_id = seed.iter().map(Record::id).max().map_or(1, |max| max + 1);
        Self {
            inner: RwLock::new(Collection {
                records: seed,
                next_id,
            }),
        }
    }

    pub fn add(&self, build: impl FnOnce(u64) -> T) -> T {
        let mut collection = self.inner.write();
        let record = build(collection.next_id);
        collection.next_id = record.id().max(collection.next_id) + 1;
        collection.records.push(record.clone());
        record
    }

    pub fn get(&self, id: u64) -> Option<T> {
        self.inner
            .read()
            .records
            .iter()
            .find(|record| record.id() == id)
            .cloned()
    }

    pub fn list(&self) -> Vec<T> {
        self.inner.read().records.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Both sample collections, shared by every handler.
#[derive(Clone)]
pub struct SampleData {
    pub users: Arc<RecordStore<User>>,
    pub projects: Arc<RecordStore<Project>>,
}

impl SampleData {
    pub fn seeded() -> Self {
        Self {
            users: Arc::new(RecordStore::new(seed_users())),
            projects: Arc::new(RecordStore::new(seed_projects())),
        }
    }
}

fn seed_users() -> Vec<User> {
    [
        (1, "Alice Johnson", "alice@example.com", "admin", "2024-01-15"),
        (2, "Bob Smith", "bob@example.com", "user", "2024-02-20"),
        (3, "Carol Wilson", "carol@example.com", "moderator", "2024-03-10"),
    ]
    .into_iter()
    .map(|(id, name, email, role, created)| User {
        id,
        name: name.to_string(),
        email: email.to_string(),
        role: role.to_string(),
        created: created.to_string(),
    })
    .collect()
}

fn seed_projects() -> Vec<Project> {
    [
        (
            1,
            "Website Redesign",
            "Refresh the public marketing site",
            1,
            "active",
            "2024-01-20",
        ),
        (
            2,
            "Mobile App",
            "Companion app for iOS and Android",
            2,
            "planning",
            "2024-02-25",
        ),
        (
            3,
            "Data Migration",
            "Move legacy records to the new schema",
            3,
            "archived",
            "2024-03-15",
        ),
    ]
    .into_iter()
    .map(|(id, name, description, owner_id, status, created)| Project {
        id,
        name: name.to_string(),
        description: description.to_string(),
        owner_id,
        status: status.to_string(),
        created: created.to_string(),
    })
    .collect()
}
