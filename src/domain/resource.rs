use std::fmt;

/// Upstream collections the gateway proxies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Books,
    MenuBook,
    Exams,
    Questions,
}

impl Resource {
    /// Path segment on the upstream API.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Books => "books",
            Self::MenuBook => "menu-book",
            Self::Exams => "exams",
            Self::Questions => "questions",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
