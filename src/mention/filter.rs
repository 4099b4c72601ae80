use crate::directory::{Category, Directory, DirectoryEntry};

/// Entries of `category` whose name or secondary field contains `query`,
/// ignoring case, in directory order. An empty query matches everything.
pub fn filter(query: &str, category: Category, directory: &Directory) -> Vec<DirectoryEntry> {
    let needle = query.to_lowercase();
    directory
        .entries(category)
        .iter()
        .filter(|entry| entry_matches(entry, &needle))
        .cloned()
        .collect()
}

fn entry_matches(entry: &DirectoryEntry, needle: &str) -> bool {
    needle.is_empty()
        || entry
            .filter_fields()
            .iter()
            .any(|field| field.to_lowercase().contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> Directory {
        Directory::new([
            DirectoryEntry::person(1, "Alice Johnson", "alice"),
            DirectoryEntry::person(2, "Bob Smith", "bsmith"),
            DirectoryEntry::object(1, "Project Alpha", "Main development project"),
            DirectoryEntry::object(2, "Project Beta", "Testing and QA project"),
            DirectoryEntry::object(3, "Design System", "UI component library"),
        ])
    }

    fn ids(entries: &[DirectoryEntry]) -> Vec<u64> {
        entries.iter().map(|entry| entry.id).collect()
    }

    #[test]
    fn empty_query_returns_whole_category_in_order() {
        let directory = directory();
        assert_eq!(ids(&filter("", Category::Object, &directory)), vec![1, 2, 3]);
        assert_eq!(ids(&filter("", Category::Person, &directory)), vec![1, 2]);
    }

    #[test]
    fn matches_either_field_case_insensitively() {
        let directory = directory();
        assert_eq!(ids(&filter("AL", Category::Person, &directory)), vec![1]);
        assert_eq!(ids(&filter("smith", Category::Person, &directory)), vec![2]);
        assert_eq!(ids(&filter("qa", Category::Object, &directory)), vec![2]);
        assert_eq!(ids(&filter("PROJECT", Category::Object, &directory)), vec![1, 2]);
    }

    #[test]
    fn result_is_ordered_subsequence_of_directory() {
        let directory = directory();
        for query in ["", "a", "e", "o", "project", "zzz"] {
            let result = filter(query, Category::Object, &directory);
            let all = directory.entries(Category::Object);
            let mut cursor = all.iter();
            for entry in &result {
                assert!(cursor.any(|candidate| candidate == entry), "{query}");
            }
            let expected = all
                .iter()
                .filter(|entry| {
                    entry.display_name.to_lowercase().contains(query)
                        || entry.secondary_text.to_lowercase().contains(query)
                })
                .count();
            assert_eq!(result.len(), expected, "{query}");
        }
    }

    #[test]
    fn no_match_yields_empty_list() {
        assert!(filter("zzz", Category::Person, &directory()).is_empty());
    }
}
