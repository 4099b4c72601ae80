//! Read-only collections of people and objects that can be mentioned.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ImportError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Person,
    Object,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Person, Category::Object];

    /// Marker written into `data-type` of inserted mention tokens.
    pub fn tag(&self) -> &'static str {
        match self {
            Category::Person => "user",
            Category::Object => "item",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "user" | "person" => Some(Category::Person),
            "item" | "object" => Some(Category::Object),
            _ => None,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Category::Person => "People",
            Category::Object => "Objects",
        }
    }

    pub fn other(&self) -> Self {
        match self {
            Category::Person => Category::Object,
            Category::Object => Category::Person,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub id: u64,
    pub display_name: String,
    /// Username for people, description for objects.
    pub secondary_text: String,
    pub category: Category,
}

impl DirectoryEntry {
    pub fn person(id: u64, name: &str, username: &str) -> Self {
        Self {
            id,
            display_name: name.to_string(),
            secondary_text: username.to_string(),
            category: Category::Person,
        }
    }

    pub fn object(id: u64, name: &str, description: &str) -> Self {
        Self {
            id,
            display_name: name.to_string(),
            secondary_text: description.to_string(),
            category: Category::Object,
        }
    }

    /// Text shown inside an inserted token.
    pub fn label(&self) -> &str {
        match self.category {
            Category::Person => &self.secondary_text,
            Category::Object => &self.display_name,
        }
    }

    pub fn filter_fields(&self) -> [&str; 2] {
        [&self.display_name, &self.secondary_text]
    }
}

#[derive(Debug, Deserialize)]
struct PersonRecord {
    id: u64,
    name: String,
    username: String,
}

#[derive(Debug, Deserialize)]
struct ObjectRecord {
    id: u64,
    name: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Default, Deserialize)]
struct DirectoryFile {
    #[serde(default)]
    people: Vec<PersonRecord>,
    #[serde(default)]
    objects: Vec<ObjectRecord>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Directory {
    people: Vec<DirectoryEntry>,
    objects: Vec<DirectoryEntry>,
}

impl Directory {
    /// Builds a directory; each entry lands in the collection of its own
    /// category, keeping relative order.
    pub fn new(entries: impl IntoIterator<Item = DirectoryEntry>) -> Self {
        let mut directory = Self::default();
        for entry in entries {
            match entry.category {
                Category::Person => directory.people.push(entry),
                Category::Object => directory.objects.push(entry),
            }
        }
        directory
    }

    pub fn entries(&self, category: Category) -> &[DirectoryEntry] {
        match category {
            Category::Person => &self.people,
            Category::Object => &self.objects,
        }
    }

    pub fn len(&self) -> usize {
        self.people.len() + self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Parses `{"people": [{id, name, username}], "objects": [{id, name, description}]}`.
    pub fn from_json(json: &str) -> Result<Self, ImportError> {
        let file: DirectoryFile = serde_json::from_str(json)?;
        let people = file
            .people
            .into_iter()
            .map(|record| DirectoryEntry::person(record.id, &record.name, &record.username));
        let objects = file
            .objects
            .into_iter()
            .map(|record| DirectoryEntry::object(record.id, &record.name, &record.description));
        Ok(Self::new(people.chain(objects)))
    }

    pub fn load(path: &Path) -> Result<Self, ImportError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Built-in data used when no directory file is given.
    pub fn sample() -> Self {
        Self::new([
            DirectoryEntry::person(1, "Alice Johnson", "alice"),
            DirectoryEntry::person(2, "Bob Smith", "bob"),
            DirectoryEntry::person(3, "Carol Williams", "carol"),
            DirectoryEntry::person(4, "David Brown", "david"),
            DirectoryEntry::person(5, "Emma Davis", "emma"),
            DirectoryEntry::object(1, "Project Alpha", "Main development project"),
            DirectoryEntry::object(2, "Project Beta", "Testing and QA project"),
            DirectoryEntry::object(3, "Design System", "UI component library"),
            DirectoryEntry::object(4, "Documentation", "Technical documentation"),
            DirectoryEntry::object(5, "API Integration", "Backend API endpoints"),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_follow_category() {
        let person = DirectoryEntry::person(1, "Alice Johnson", "alice");
        let object = DirectoryEntry::object(2, "Project Beta", "Testing and QA project");
        assert_eq!(person.label(), "alice");
        assert_eq!(object.label(), "Project Beta");
    }

    #[test]
    fn new_partitions_by_category_in_order() {
        let directory = Directory::new([
            DirectoryEntry::object(1, "One", ""),
            DirectoryEntry::person(7, "Seven", "seven"),
            DirectoryEntry::object(2, "Two", ""),
        ]);
        let objects: Vec<u64> = directory
            .entries(Category::Object)
            .iter()
            .map(|entry| entry.id)
            .collect();
        assert_eq!(objects, vec![1, 2]);
        assert_eq!(directory.entries(Category::Person).len(), 1);
        assert_eq!(directory.len(), 3);
    }

    #[test]
    fn from_json_reads_both_collections() {
        let json = r#"{
            "people": [{"id": 3, "name": "Zoe Park", "username": "zoe"}],
            "objects": [{"id": 9, "name": "Roadmap"}]
        }"#;
        let directory = Directory::from_json(json).unwrap();
        let person = &directory.entries(Category::Person)[0];
        assert_eq!(person.display_name, "Zoe Park");
        assert_eq!(person.secondary_text, "zoe");
        let object = &directory.entries(Category::Object)[0];
        assert_eq!(object.id, 9);
        assert_eq!(object.secondary_text, "");
    }

    #[test]
    fn from_json_rejects_malformed_input() {
        assert!(matches!(
            Directory::from_json("{\"people\": 3}"),
            Err(ImportError::Json(_))
        ));
    }

    #[test]
    fn category_tags_round_trip() {
        for category in Category::ALL {
            assert_eq!(Category::from_tag(category.tag()), Some(category));
        }
        assert_eq!(Category::from_tag("person"), Some(Category::Person));
        assert_eq!(Category::from_tag("widget"), None);
    }
}
