//! Chapter/exam content nodes and the two-level tree built from them.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::lenient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Chapter,
    Exam,
    #[default]
    Other,
}

impl NodeKind {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "chapter" => Self::Chapter,
            "exam" => Self::Exam,
            _ => Self::Other,
        }
    }
}

impl<'de> Deserialize<'de> for NodeKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(raw) => Self::parse(&raw),
            _ => Self::Other,
        })
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Chapter => "chapter",
            Self::Exam => "exam",
            Self::Other => "other",
        })
    }
}

/// Exam attached to a menu entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamRef {
    #[serde(deserialize_with = "lenient::id")]
    pub id: String,
    #[serde(
        default,
        rename = "downloadUrl",
        alias = "download_url",
        alias = "file_download"
    )]
    pub download_url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One menu-book record. Fields the gateway does not interpret, including a
/// raw `exam` object, are kept in `extra` and serialized back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "NodeRecord")]
pub struct ContentNode {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub title: Option<String>,
    #[serde(rename = "codeId")]
    pub code_id: Option<String>,
    #[serde(rename = "parentId")]
    pub parent_id: Option<String>,
    pub order: i64,
    pub active: bool,
    /// Read from `examRef`, or derived from a readable `exam` object.
    #[serde(rename = "examRef", skip_serializing_if = "Option::is_none")]
    pub exam_ref: Option<ExamRef>,
    pub children: Vec<ContentNode>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Deserialize)]
struct NodeRecord {
    #[serde(deserialize_with = "lenient::id")]
    id: String,
    #[serde(rename = "type", default)]
    kind: NodeKind,
    #[serde(default, deserialize_with = "lenient::text")]
    title: Option<String>,
    #[serde(
        rename = "codeId",
        alias = "code_id",
        default,
        deserialize_with = "lenient::optional_id"
    )]
    code_id: Option<String>,
    #[serde(
        rename = "parentId",
        alias = "parent_id",
        default,
        deserialize_with = "lenient::optional_id"
    )]
    parent_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::integer")]
    order: i64,
    #[serde(default = "default_active", deserialize_with = "lenient::flag")]
    active: bool,
    #[serde(
        rename = "examRef",
        alias = "exam_ref",
        default,
        deserialize_with = "exam_ref"
    )]
    exam_ref: Option<ExamRef>,
    #[serde(default, deserialize_with = "lenient::list")]
    children: Vec<ContentNode>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl From<NodeRecord> for ContentNode {
    fn from(record: NodeRecord) -> Self {
        // Upstream sends `exam: null`, `exam: {}` or a full object; only the
        // last yields an ExamRef, and the raw value stays in `extra` either way.
        let exam_ref = record.exam_ref.or_else(|| {
            record
                .extra
                .get("exam")
                .and_then(|exam| serde_json::from_value(exam.clone()).ok())
        });

        Self {
            id: record.id,
            kind: record.kind,
            title: record.title,
            code_id: record.code_id,
            parent_id: record.parent_id,
            order: record.order,
            active: record.active,
            exam_ref,
            children: record.children,
            extra: record.extra,
        }
    }
}

fn default_active() -> bool {
    true
}

fn exam_ref<'de, D>(deserializer: D) -> Result<Option<ExamRef>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

impl ContentNode {
    pub fn is_top_level(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Result of assembling one page of menu records.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentTree {
    pub roots: Vec<ContentNode>,
    /// Children whose parent is not a top-level node of the same page.
    pub dropped: usize,
}

/// Rebuild the chapter/exam hierarchy from a flat page of records.
///
/// Top-level nodes keep upstream order. Each collects the records whose
/// `parentId` names it, stable-sorted by `order`. The tree is two levels deep:
/// records pointing at a non-top-level node, or at a node missing from the page,
/// are dropped.
pub fn assemble_content_tree(records: Vec<ContentNode>) -> ContentTree {
    let mut roots: Vec<ContentNode> = Vec::new();
    let mut pending: Vec<ContentNode> = Vec::new();

    for mut record in flatten(records) {
        record.children.clear();
        if record.is_top_level() {
            roots.push(record);
        } else {
            pending.push(record);
        }
    }

    let mut index: HashMap<String, usize> = HashMap::with_capacity(roots.len());
    for (position, root) in roots.iter().enumerate() {
        index.entry(root.id.clone()).or_insert(position);
    }

    let mut dropped = 0;
    for child in pending {
        let slot = child
            .parent_id
            .as_deref()
            .and_then(|parent| index.get(parent).copied());
        match slot {
            Some(position) => roots[position].children.push(child),
            None => dropped += 1,
        }
    }

    for root in &mut roots {
        root.children.sort_by_key(|child| child.order);
    }

    ContentTree { roots, dropped }
}

// Records may already arrive nested one level; lift children back into the
// flat list so they are ordered and filtered like every other record.
fn flatten(records: Vec<ContentNode>) -> Vec<ContentNode> {
    let mut flat = Vec::with_capacity(records.len());
    for mut record in records {
        let nested = std::mem::take(&mut record.children);
        let parent = record.id.clone();
        flat.push(record);
        for mut child in nested {
            child.children.clear();
            if child.parent_id.is_none() {
                child.parent_id = Some(parent.clone());
            }
            flat.push(child);
        }
    }
    flat
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn node(id: &str, parent: Option<&str>, order: i64) -> ContentNode {
        serde_json::from_value(json!({
            "id": id,
            "type": "chapter",
            "title": format!("Node {id}"),
            "parentId": parent,
            "order": order,
        }))
        .expect("node")
    }

    fn ids(nodes: &[ContentNode]) -> Vec<&str> {
        nodes.iter().map(|node| node.id.as_str()).collect()
    }

    #[test]
    fn children_are_sorted_by_order_and_attached_to_their_parent() {
        let tree = assemble_content_tree(vec![
            node("a", None, 1),
            node("a3", Some("a"), 3),
            node("b", None, 2),
            node("a1", Some("a"), 1),
            node("b1", Some("b"), 1),
            node("a2", Some("a"), 2),
        ]);

        assert_eq!(ids(&tree.roots), vec!["a", "b"]);
        assert_eq!(ids(&tree.roots[0].children), vec!["a1", "a2", "a3"]);
        assert_eq!(ids(&tree.roots[1].children), vec!["b1"]);
        assert_eq!(tree.dropped, 0);
    }

    #[test]
    fn equal_order_keeps_upstream_sequence() {
        let tree = assemble_content_tree(vec![
            node("root", None, 0),
            node("second", Some("root"), 5),
            node("first", Some("root"), 5),
            node("zero", Some("root"), 0),
        ]);

        assert_eq!(ids(&tree.roots[0].children), vec!["zero", "second", "first"]);
    }

    #[test]
    fn orphaned_children_are_dropped() {
        let tree = assemble_content_tree(vec![node("A", None, 0), node("B", Some("Z"), 0)]);

        assert_eq!(ids(&tree.roots), vec!["A"]);
        assert!(tree.roots[0].children.is_empty());
        assert_eq!(tree.dropped, 1);
    }

    #[test]
    fn grandchildren_do_not_create_a_third_level() {
        let tree = assemble_content_tree(vec![
            node("root", None, 0),
            node("child", Some("root"), 0),
            node("grandchild", Some("child"), 0),
        ]);

        assert_eq!(ids(&tree.roots[0].children), vec!["child"]);
        assert!(tree.roots[0].children[0].children.is_empty());
        assert_eq!(tree.dropped, 1);
    }

    #[test]
    fn nested_upstream_children_are_reordered() {
        let mut root = node("root", None, 0);
        root.children = vec![node("late", None, 9), node("early", None, 1)];

        let tree = assemble_content_tree(vec![root]);

        assert_eq!(ids(&tree.roots[0].children), vec!["early", "late"]);
        assert_eq!(tree.roots[0].children[0].parent_id.as_deref(), Some("root"));
    }

    #[test]
    fn unknown_fields_round_trip() {
        let raw = json!({
            "id": 7,
            "type": "EXAM",
            "title": "Midterm",
            "code_id": "C-7",
            "parent_id": "",
            "order": "2",
            "active": 0,
            "exam": { "id": "e1", "file_download": "https://cdn/e1.pdf" },
            "cover": "https://cdn/cover.png"
        });

        let node: ContentNode = serde_json::from_value(raw).expect("node");
        assert_eq!(node.id, "7");
        assert_eq!(node.kind, NodeKind::Exam);
        assert!(node.is_top_level());
        assert_eq!(node.order, 2);
        assert!(!node.active);
        assert_eq!(
            node.exam_ref.as_ref().and_then(|exam| exam.download_url.as_deref()),
            Some("https://cdn/e1.pdf")
        );

        let value = serde_json::to_value(&node).expect("serialize");
        assert_eq!(value["cover"], "https://cdn/cover.png");
        assert_eq!(value["type"], "exam");
        assert_eq!(value["codeId"], "C-7");
        assert_eq!(value["examRef"]["downloadUrl"], "https://cdn/e1.pdf");
        assert_eq!(value["exam"]["file_download"], "https://cdn/e1.pdf");
    }

    #[test]
    fn empty_exam_object_is_kept_verbatim() {
        let node: ContentNode =
            serde_json::from_value(json!({ "id": "x", "exam": {} })).expect("node");
        assert!(node.exam_ref.is_none());
        assert!(node.active);

        let value = serde_json::to_value(&node).expect("serialize");
        assert_eq!(value["exam"], json!({}));
        assert!(value.get("examRef").is_none());
    }

    #[test]
    fn loosely_typed_chapters_stay_in_the_tree() {
        let records: Vec<ContentNode> = vec![
            serde_json::from_value(json!({ "id": "A", "children": null })).expect("A"),
            serde_json::from_value(json!({ "id": "B", "title": 2024 })).expect("B"),
            serde_json::from_value(json!({ "id": "C" })).expect("C"),
            node("a1", Some("A"), 0),
        ];

        let tree = assemble_content_tree(records);

        assert_eq!(ids(&tree.roots), vec!["A", "B", "C"]);
        assert_eq!(ids(&tree.roots[0].children), vec!["a1"]);
        assert_eq!(tree.roots[1].title.as_deref(), Some("2024"));
        assert_eq!(tree.dropped, 0);
    }
}
