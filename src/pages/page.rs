//! A single page and its identifier

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::content::Fragment;

/// Stable identifier for pages that survives reflows
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct PageId(pub u64);

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One fixed-capacity unit of the document's layout partition
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub(crate) id: PageId,
    pub(crate) content: Fragment,
}

impl Page {
    pub(crate) fn new(id: PageId, content: Fragment) -> Self {
        Self { id, content }
    }

    pub fn id(&self) -> PageId {
        self.id
    }

    pub fn content(&self) -> &Fragment {
        &self.content
    }

    /// Page content as markup
    pub fn markup(&self) -> String {
        self.content.to_markup()
    }

    /// Whitespace-only or empty
    pub fn is_blank(&self) -> bool {
        self.content.is_blank()
    }
}

/// Serializable view of a page for the document layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSnapshot {
    pub id: PageId,
    pub content: String,
}

impl From<&Page> for PageSnapshot {
    fn from(page: &Page) -> Self {
        Self {
            id: page.id,
            content: page.markup(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_json() {
        let page = Page::new(PageId(7), Fragment::parse("<b>hi</b>"));
        let json = serde_json::to_string(&PageSnapshot::from(&page)).unwrap();
        assert_eq!(json, r#"{"id":7,"content":"<b>hi</b>"}"#);
    }
}
