use serde::Serialize;
use serde_json::Value;

use super::content::ContentNode;

/// Discriminator carried by an upstream search response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    Book,
    MenuBook,
    Question,
}

impl SearchKind {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim() {
            "book" => Some(Self::Book),
            "menu-book" => Some(Self::MenuBook),
            "question" => Some(Self::Question),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultSet {
    pub books: Vec<Value>,
    pub chapter_entries: Vec<ContentNode>,
    pub questions: Vec<Value>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchCounts {
    pub books: usize,
    pub menu_books: usize,
    pub questions: usize,
    pub total: usize,
}

impl SearchResultSet {
    pub fn counts(&self) -> SearchCounts {
        let books = self.books.len();
        let menu_books = self.chapter_entries.len();
        let questions = self.questions.len();
        SearchCounts {
            books,
            menu_books,
            questions,
            total: books + menu_books + questions,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.counts().total == 0
    }
}

/// Body returned by the search endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResponse {
    #[serde(flatten)]
    pub results: SearchResultSet,
    pub counts: SearchCounts,
}

impl From<SearchResultSet> for SearchResponse {
    fn from(results: SearchResultSet) -> Self {
        let counts = results.counts();
        Self { results, counts }
    }
}
