//! Floppy directory tree
//!
//! The core reports the image contents as loosely structured JSON:
//!
//! ```json
//! { "name": "A:", "type": "disk", "size": 737280,
//!   "children": [ { "name": "GAME.BAS", "type": "file", "size": 1024 } ] }
//! ```
//!
//! Parsing is forgiving. Missing or mistyped fields fall back to defaults
//! rather than rejecting the whole tree.

use std::fmt;

use serde_json::Value;

use super::FloppyImageService;

/// One entry of the disk tree
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiskDirectoryNode {
    pub name: String,
    pub is_directory: bool,
    /// Disk root. Always also a directory.
    pub is_disk: bool,
    pub size: i64,
    pub children: Vec<DiskDirectoryNode>,
}

impl DiskDirectoryNode {
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Size column text
    pub fn size_text(&self) -> String {
        if self.is_disk {
            if self.size > 0 {
                format!("{} bytes", self.size)
            } else {
                "no data".to_string()
            }
        } else if self.is_directory {
            "directory".to_string()
        } else {
            format!("{} bytes", self.size)
        }
    }

    /// Depth-first search by name
    pub fn find(&self, name: &str) -> Option<&DiskDirectoryNode> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }

    /// (directories, files) below this node; disk roots are not counted
    pub fn count_entries(&self) -> (usize, usize) {
        self.children.iter().fold((0, 0), |(dirs, files), child| {
            let (sub_dirs, sub_files) = child.count_entries();
            let dir = usize::from(child.is_directory && !child.is_disk);
            let file = usize::from(!child.is_directory);
            (dirs + dir + sub_dirs, files + file + sub_files)
        })
    }

    fn from_value(value: &Value) -> Self {
        let name = value.get("name").and_then(Value::as_str).unwrap_or_default().to_string();
        let kind = value.get("type").and_then(Value::as_str).unwrap_or("file");
        let is_disk = kind.eq_ignore_ascii_case("disk");
        let is_directory = is_disk || kind.eq_ignore_ascii_case("dir");
        let size = value.get("size").and_then(Value::as_i64).unwrap_or(0);
        let children = match value.get("children") {
            Some(Value::Array(items)) => items.iter().map(Self::from_value).collect(),
            _ => Vec::new(),
        };

        Self {
            name,
            is_directory,
            is_disk,
            size,
            children,
        }
    }
}

/// Parse the core's tree JSON. The root may be a node or an array whose first
/// element is the node. Returns `None` for invalid JSON or other root kinds.
pub fn parse_root(json: &str) -> Option<DiskDirectoryNode> {
    let value: Value = serde_json::from_str(json).ok()?;
    match &value {
        Value::Object(_) => Some(DiskDirectoryNode::from_value(&value)),
        Value::Array(items) => items.first().map(DiskDirectoryNode::from_value),
        _ => None,
    }
}

/// Status line under the tree
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiskStatus {
    NoDisk,
    Empty,
    Summary { directories: usize, files: usize },
    ReadFailed,
}

impl DiskStatus {
    pub fn for_root(root: &DiskDirectoryNode) -> Self {
        match root.count_entries() {
            (0, 0) => DiskStatus::Empty,
            (directories, files) => DiskStatus::Summary { directories, files },
        }
    }
}

impl fmt::Display for DiskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiskStatus::NoDisk => write!(f, "No disk loaded"),
            DiskStatus::Empty => write!(f, "Disk is empty"),
            DiskStatus::Summary { directories, files } => {
                write!(f, "{} directories, {} files", directories, files)
            }
            DiskStatus::ReadFailed => write!(f, "Failed to read disk directory"),
        }
    }
}

/// Tree plus status, the state behind the disk management view
#[derive(Clone, Debug)]
pub struct DiskDirectoryView {
    items: Vec<DiskDirectoryNode>,
    status: DiskStatus,
    selected: Option<String>,
}

impl Default for DiskDirectoryView {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            status: DiskStatus::NoDisk,
            selected: None,
        }
    }
}

impl DiskDirectoryView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[DiskDirectoryNode] {
        &self.items
    }

    pub fn status(&self) -> &DiskStatus {
        &self.status
    }

    pub fn select(&mut self, name: Option<String>) {
        self.selected = name;
    }

    pub fn selected(&self) -> Option<&DiskDirectoryNode> {
        let name = self.selected.as_deref()?;
        self.items.iter().find_map(|root| root.find(name))
    }

    /// Reload from the image service. Never fails; problems show up in the status.
    pub fn refresh<S: FloppyImageService + ?Sized>(&mut self, service: &S) {
        let (items, status) = match service.directory_tree() {
            Ok(json) if json.trim().is_empty() => (Vec::new(), DiskStatus::NoDisk),
            Ok(json) => match parse_root(&json) {
                Some(root) => {
                    let status = DiskStatus::for_root(&root);
                    (vec![root], status)
                }
                None => (Vec::new(), DiskStatus::NoDisk),
            },
            Err(e) => {
                tracing::warn!("disk tree refresh: {}", e);
                (Vec::new(), DiskStatus::ReadFailed)
            }
        };
        self.items = items;
        self.status = status;

        if self.selected.is_some() && self.selected().is_none() {
            self.selected = None;
        }
    }
}
