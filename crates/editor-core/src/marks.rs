use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A character-level formatting tag. Unrecognized tags keep their type string
/// so they re-serialize verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Mark {
    Bold,
    Italic,
    Underlined,
    Code,
    Other(String),
}

impl Mark {
    pub fn as_str(&self) -> &str {
        match self {
            Mark::Bold => "bold",
            Mark::Italic => "italic",
            Mark::Underlined => "underlined",
            Mark::Code => "code",
            Mark::Other(kind) => kind,
        }
    }
}

impl From<&str> for Mark {
    fn from(kind: &str) -> Self {
        match kind {
            "bold" => Mark::Bold,
            "italic" => Mark::Italic,
            "underlined" => Mark::Underlined,
            "code" => Mark::Code,
            other => Mark::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Mark {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Mark {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let kind = String::deserialize(deserializer)?;
        Ok(Mark::from(kind.as_str()))
    }
}

/// The set of marks applied to one run. Order is irrelevant and duplicates
/// are impossible.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkSet(BTreeSet<Mark>);

impl MarkSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, mark: &Mark) -> bool {
        self.0.contains(mark)
    }

    pub fn insert(&mut self, mark: Mark) -> bool {
        self.0.insert(mark)
    }

    pub fn remove(&mut self, mark: &Mark) -> bool {
        self.0.remove(mark)
    }

    /// Removes the mark if present, inserts it otherwise.
    pub fn toggle(&mut self, mark: Mark) {
        if !self.0.remove(&mark) {
            self.0.insert(mark);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mark> {
        self.0.iter()
    }

    pub fn intersection(&self, other: &MarkSet) -> MarkSet {
        MarkSet(self.0.intersection(&other.0).cloned().collect())
    }
}

impl FromIterator<Mark> for MarkSet {
    fn from_iter<I: IntoIterator<Item = Mark>>(iter: I) -> Self {
        MarkSet(iter.into_iter().collect())
    }
}

impl IntoIterator for MarkSet {
    type Item = Mark;
    type IntoIter = std::collections::btree_set::IntoIter<Mark>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_adds_then_removes() {
        let mut marks = MarkSet::new();
        marks.toggle(Mark::Bold);
        assert!(marks.contains(&Mark::Bold));
        marks.toggle(Mark::Bold);
        assert!(marks.is_empty());
    }

    #[test]
    fn intersection_keeps_common_marks() {
        let a: MarkSet = [Mark::Bold, Mark::Italic].into_iter().collect();
        let b: MarkSet = [Mark::Bold, Mark::Code].into_iter().collect();
        let common = a.intersection(&b);
        assert!(common.contains(&Mark::Bold));
        assert_eq!(common.len(), 1);
    }

    #[test]
    fn unknown_mark_keeps_its_tag() {
        let mark = Mark::from("highlight");
        assert_eq!(mark.as_str(), "highlight");
    }
}
