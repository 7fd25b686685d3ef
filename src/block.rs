//! [`Block`], the tagged variant {Section, Entry} that forms every node of a config tree.

use crate::section::Section;
use crate::value::Value;

/// Comment metadata attached to a block. Opaque to the core beyond the fact that it migrates
/// with its owning block across re-parenting (§3 invariant 5).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Comments {
    /// Comment lines appearing above the key, in document order.
    pub leading: Vec<String>,
    /// A trailing comment on the same line as the key.
    pub inline: Option<String>,
}

impl Comments {
    pub fn is_empty(&self) -> bool {
        self.leading.is_empty() && self.inline.is_none()
    }
}

/// A leaf block: a single raw value plus its comments.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub value: Value,
    pub comments: Comments,
}

impl Entry {
    pub fn new(value: Value) -> Entry {
        Entry {
            value,
            comments: Comments::default(),
        }
    }

    pub fn with_comments(value: Value, comments: Comments) -> Entry {
        Entry { value, comments }
    }
}

/// The tagged variant at the heart of the tree: either a leaf [`Entry`] or a nested [`Section`].
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Entry(Entry),
    Section(Section),
}

impl Block {
    pub fn is_section(&self) -> bool {
        matches!(self, Block::Section(_))
    }

    pub fn as_section(&self) -> Option<&Section> {
        match self {
            Block::Section(s) => Some(s),
            Block::Entry(_) => None,
        }
    }

    pub fn as_section_mut(&mut self) -> Option<&mut Section> {
        match self {
            Block::Section(s) => Some(s),
            Block::Entry(_) => None,
        }
    }

    pub fn into_section(self) -> Option<Section> {
        match self {
            Block::Section(s) => Some(s),
            Block::Entry(_) => None,
        }
    }

    pub fn as_entry(&self) -> Option<&Entry> {
        match self {
            Block::Entry(e) => Some(e),
            Block::Section(_) => None,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        self.as_entry().map(|e| &e.value)
    }

    pub fn comments(&self) -> &Comments {
        match self {
            Block::Entry(e) => &e.comments,
            Block::Section(s) => s.comments(),
        }
    }

    pub fn comments_mut(&mut self) -> &mut Comments {
        match self {
            Block::Entry(e) => &mut e.comments,
            Block::Section(s) => s.comments_mut(),
        }
    }

    /// Produces a block sharing no references with `self`.
    ///
    /// Since neither `Entry` nor `Section` hold shared (`Rc`-like) state -- back-references are
    /// recomputed paths, not pointers -- a plain structural clone already satisfies "shares no
    /// references with its source". The clone's `name`/`route` are stale until it is attached
    /// somewhere via [`Section::set`], which re-derives them for the whole subtree.
    pub fn deep_clone(&self) -> Block {
        self.clone()
    }
}

impl From<Entry> for Block {
    fn from(e: Entry) -> Self {
        Block::Entry(e)
    }
}

impl From<Section> for Block {
    fn from(s: Section) -> Self {
        Block::Section(s)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn deep_clone_is_independent() {
        let original = Block::Entry(Entry::new(json!({"a": 1})));
        let mut clone = original.deep_clone();
        if let Block::Entry(e) = &mut clone {
            e.value = json!("changed");
        }
        assert_eq!(original.as_value().unwrap(), &json!({"a": 1}));
    }

    #[test]
    fn comments_migrate_with_clone() {
        let comments = Comments {
            leading: vec!["hi".to_string()],
            inline: None,
        };
        let original = Block::Entry(Entry::with_comments(json!(1), comments.clone()));
        let clone = original.deep_clone();
        assert_eq!(clone.comments(), &comments);
    }
}
