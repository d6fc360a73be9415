//! Tools for inspecting the framing of Graphcode streams.
//! Useful for debugging schema drift and verifying what a producer actually wrote.

use std::fmt;

use serde::Serialize;

use crate::api::Graphcode;
use crate::descriptor::TypeInfo;
use crate::error::Result;
use crate::format::{WireDescriptor, WireHeader, FORMAT_VERSION};
use crate::wire::WireReader;

/// A structural report of a Graphcode stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamReport {
    /// Total size of the stream.
    pub total_len: usize,
    /// Format version from the header; `None` for an empty (absent) stream.
    pub format_version: Option<i16>,
    /// Omit flag from the header; `None` for an empty (absent) stream.
    pub omit_root_type_name: Option<bool>,
    /// Root type name, when the stream carries it.
    pub root_type: Option<String>,
    /// Root structural hash, when the stream carries it.
    pub root_hash: Option<i32>,
    /// Local structural hash of the root type, when it is registered.
    pub local_hash: Option<i32>,
    /// Offset of the root payload.
    pub payload_offset: usize,
    /// Size of the root payload.
    pub payload_len: usize,
    /// Layout of the root type, when it is registered.
    pub layout: Option<LayoutNode>,
}

impl StreamReport {
    /// Returns `true` if the stream encodes the absent value.
    pub fn is_absent(&self) -> bool {
        self.total_len == 0
    }

    /// Returns `true` if the root hash in the stream differs from the registered type's.
    pub fn schema_changed(&self) -> bool {
        matches!((self.root_hash, self.local_hash), (Some(a), Some(b)) if a != b)
    }
}

/// One node of a registered type's layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutNode {
    /// Field, variant or element name; `None` at the root.
    pub member: Option<String>,
    /// Serialized type name.
    pub type_name: String,
    /// Shape of the type, when known.
    pub kind: Option<String>,
    /// Set when the node refers back to a type already being expanded.
    pub recursive: bool,
    /// Members in encoding order.
    pub children: Vec<LayoutNode>,
}

impl LayoutNode {
    fn expand(member: Option<String>, info: &TypeInfo, open: &mut Vec<String>) -> Self {
        open.push(info.name().to_owned());
        let mut children = Vec::with_capacity(info.fields().len());
        for field in info.fields() {
            let child = match field.info() {
                Some(_) if open.iter().any(|n| n == field.type_name()) => Self {
                    member: Some(field.name().to_owned()),
                    type_name: field.type_name().to_owned(),
                    kind: None,
                    recursive: true,
                    children: Vec::new(),
                },
                Some(nested) => Self::expand(Some(field.name().to_owned()), &nested, open),
                None => Self {
                    member: Some(field.name().to_owned()),
                    type_name: field.type_name().to_owned(),
                    kind: None,
                    recursive: false,
                    children: Vec::new(),
                },
            };
            children.push(child);
        }
        open.pop();
        Self {
            member,
            type_name: info.name().to_owned(),
            kind: Some(format!("{:?}", info.kind())),
            recursive: false,
            children,
        }
    }
}

impl Graphcode {
    /// Reads the header and root descriptor of a stream without decoding its payload.
    ///
    /// The root type is looked up in this engine's registry; if it is known, the report also
    /// carries the local hash and layout so drift can be spotted at a glance.
    pub fn inspect(&self, bytes: &[u8]) -> Result<StreamReport> {
        let mut report = StreamReport {
            total_len: bytes.len(),
            format_version: None,
            omit_root_type_name: None,
            root_type: None,
            root_hash: None,
            local_hash: None,
            payload_offset: 0,
            payload_len: 0,
            layout: None,
        };
        if bytes.is_empty() {
            return Ok(report);
        }

        let mut wire = WireReader::new(bytes);
        let header = WireHeader::read(&mut wire)?;
        report.format_version = Some(header.format_version);
        report.omit_root_type_name = Some(header.omit_root_type_name);

        // An unknown version may frame its descriptor differently; stop at the header.
        if header.format_version == FORMAT_VERSION && !header.omit_root_type_name {
            let root = WireDescriptor::read(&mut wire)?;
            if let Ok(codec) = self.registry().resolve(&root.name) {
                report.local_hash = Some(codec.descriptor().structural_hash());
                report.layout = Some(LayoutNode::expand(None, &codec.type_info(), &mut Vec::new()));
            }
            report.root_hash = Some(root.hash);
            report.root_type = Some(root.name);
        }

        report.payload_offset = wire.position();
        report.payload_len = wire.remaining();
        Ok(report)
    }
}

impl fmt::Display for StreamReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== GRAPHCODE STREAM REPORT ===")?;
        if self.is_absent() {
            return writeln!(f, "Absent value (empty stream)");
        }
        writeln!(f, "Total Size:     {}b", self.total_len)?;
        if let Some(version) = self.format_version {
            writeln!(f, "Version:        {version}")?;
        }
        match (&self.root_type, self.root_hash) {
            (Some(name), Some(hash)) => writeln!(f, "Root Type:      {name} ({hash:#010x})")?,
            _ => writeln!(f, "Root Type:      <omitted>")?,
        }
        if self.schema_changed() {
            writeln!(f, "Local Hash:     {:#010x} (CHANGED)", self.local_hash.unwrap_or_default())?;
        }
        writeln!(
            f,
            "Payload:        {}b at offset {}",
            self.payload_len, self.payload_offset
        )?;
        if let Some(layout) = &self.layout {
            writeln!(f, "\n[TYPE LAYOUT]")?;
            layout.fmt_recursive(f, "", true)?;
        }
        Ok(())
    }
}

impl LayoutNode {
    fn fmt_recursive(&self, f: &mut fmt::Formatter<'_>, prefix: &str, is_last: bool) -> fmt::Result {
        let connector = if is_last { "└── " } else { "├── " };
        let child_prefix = if is_last { "    " } else { "│   " };
        let member = self
            .member
            .as_deref()
            .map(|m| format!("{m}: "))
            .unwrap_or_default();
        let kind = self
            .kind
            .as_deref()
            .map(|k| format!(" [{k}]"))
            .unwrap_or_default();
        let cycle = if self.recursive { " (recursive)" } else { "" };
        writeln!(f, "{prefix}{connector}{member}{}{kind}{cycle}", self.type_name)?;

        for (i, child) in self.children.iter().enumerate() {
            let is_last_child = i + 1 == self.children.len();
            child.fmt_recursive(f, &format!("{prefix}{child_prefix}"), is_last_child)?;
        }
        Ok(())
    }
}
