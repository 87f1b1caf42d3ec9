//! `[VIZ:<filename>]` references: the marker an agent splices into reply text to point
//! at a stored artifact, and the consumer-side logic that pulls those markers back out.
//!
//! Only the artifact's base name ever appears in text. The accepted filename grammar is
//! `[A-Za-z0-9_]+\.png`; anything else is left untouched as literal text.

use crate::error::{Result, VizError};
use crate::store::ArtifactStore;
use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::path::{Path, PathBuf};

static REFERENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[VIZ:([a-zA-Z0-9_]+\.png)\]").expect("valid reference regex"));

static FILENAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_]+\.png$").expect("valid filename regex"));

pub fn is_valid_filename(name: &str) -> bool {
    FILENAME_RE.is_match(name)
}

/// A single embedded reference, holding just the base name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VizReference {
    filename: String,
}

impl VizReference {
    /// Build a reference from an artifact path, dropping every directory component.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| invalid_name(&path.display().to_string()))?;
        Self::from_filename(name)
    }

    pub fn from_filename(name: &str) -> Result<Self> {
        if !is_valid_filename(name) {
            return Err(invalid_name(name));
        }
        Ok(Self {
            filename: name.to_string(),
        })
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }
}

fn invalid_name(name: &str) -> VizError {
    VizError::InvalidRequest(format!("'{}' cannot be embedded as a visualization reference", name))
}

impl fmt::Display for VizReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[VIZ:{}]", self.filename)
    }
}

/// Insert `reference` into `text` before the `at`-th character (clamped to the end).
pub fn splice(text: &str, at: usize, reference: &VizReference) -> String {
    let byte_idx = text
        .char_indices()
        .nth(at)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    let marker = reference.to_string();
    let mut out = String::with_capacity(text.len() + marker.len());
    out.push_str(&text[..byte_idx]);
    out.push_str(&marker);
    out.push_str(&text[byte_idx..]);
    out
}

/// Piece of a reply in reading order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Prose(String),
    Artifact(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// The text with every reference removed and nothing else changed.
    pub prose: String,
    /// Prose and references interleaved as they appeared. Empty prose runs are omitted.
    pub segments: Vec<Segment>,
    /// Referenced filenames, first to last, duplicates kept.
    pub filenames: Vec<String>,
}

pub fn extract(text: &str) -> Extraction {
    let mut prose = String::with_capacity(text.len());
    let mut segments = Vec::new();
    let mut filenames = Vec::new();
    let mut last = 0;

    for caps in REFERENCE_RE.captures_iter(text) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let before = &text[last..whole.start()];
        prose.push_str(before);
        if !before.is_empty() {
            segments.push(Segment::Prose(before.to_string()));
        }
        segments.push(Segment::Artifact(name.as_str().to_string()));
        filenames.push(name.as_str().to_string());
        last = whole.end();
    }

    let tail = &text[last..];
    prose.push_str(tail);
    if !tail.is_empty() {
        segments.push(Segment::Prose(tail.to_string()));
    }

    Extraction {
        prose,
        segments,
        filenames,
    }
}

/// Consumer view of one reference after resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Image { filename: String, path: PathBuf },
    Missing { filename: String },
}

impl Block {
    pub fn filename(&self) -> &str {
        match self {
            Block::Image { filename, .. } | Block::Missing { filename } => filename,
        }
    }

    /// Text shown in place of an artifact that could not be found.
    pub fn warning(&self) -> Option<String> {
        match self {
            Block::Image { .. } => None,
            Block::Missing { filename } => Some(format!("Visualization not found: {}", filename)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedReply {
    pub text: String,
    pub blocks: Vec<Block>,
}

/// Strip references from a reply and resolve each against `store`.
/// A missing artifact becomes a `Missing` block; it never fails the reply.
pub fn render_reply(text: &str, store: &ArtifactStore) -> RenderedReply {
    let extraction = extract(text);
    let blocks = extraction
        .filenames
        .into_iter()
        .map(|filename| match store.resolve(&filename) {
            Some(path) => Block::Image { filename, path },
            None => {
                warn!("Visualization not found: {}", filename);
                Block::Missing { filename }
            }
        })
        .collect();

    RenderedReply {
        text: extraction.prose,
        blocks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_reference_uses_base_name_only() {
        let reference = VizReference::from_path("/srv/app/viz_outputs/viz_0a1b2c3d.png").unwrap();
        assert_eq!(reference.to_string(), "[VIZ:viz_0a1b2c3d.png]");
        assert!(!reference.to_string().contains("viz_outputs"));
    }

    #[test]
    fn test_reference_rejects_names_outside_grammar() {
        assert!(VizReference::from_path("/tmp/chart.jpg").is_err());
        assert!(VizReference::from_path("/tmp/my-chart.png").is_err());
        assert!(VizReference::from_path("/").is_err());
    }

    #[test]
    fn test_splice_at_char_index() {
        let reference = VizReference::from_filename("viz_deadbeef.png").unwrap();
        assert_eq!(
            splice("Résumé here", 7, &reference),
            "Résumé [VIZ:viz_deadbeef.png]here"
        );
        assert_eq!(splice("end", 99, &reference), "end[VIZ:viz_deadbeef.png]");
    }

    #[test]
    fn test_extract_preserves_order() {
        let text = "Intro [VIZ:a.png] middle [VIZ:b_2.png] outro";
        let extraction = extract(text);
        assert_eq!(extraction.prose, "Intro  middle  outro");
        assert_eq!(extraction.filenames, vec!["a.png", "b_2.png"]);
        assert_eq!(
            extraction.segments,
            vec![
                Segment::Prose("Intro ".into()),
                Segment::Artifact("a.png".into()),
                Segment::Prose(" middle ".into()),
                Segment::Artifact("b_2.png".into()),
                Segment::Prose(" outro".into()),
            ]
        );
    }

    #[test]
    fn test_extract_leaves_unsafe_tags_as_text() {
        let text = "[VIZ:../secret.png] [VIZ:chart.jpg] [VIZ:a b.png] [VIZ:/etc/x.png]";
        let extraction = extract(text);
        assert!(extraction.filenames.is_empty());
        assert_eq!(extraction.prose, text);
    }

    #[test]
    fn test_round_trip_through_text() {
        let path = Path::new("/var/out/viz_1234abcd.png");
        let reply = format!("Here you go: {}", VizReference::from_path(path).unwrap());
        let extraction = extract(&reply);
        assert_eq!(extraction.filenames, vec!["viz_1234abcd.png"]);
        assert_eq!(extraction.prose, "Here you go: ");
    }

    #[test]
    fn test_missing_artifact_degrades_to_warning() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArtifactStore::open(tmp.path()).unwrap();

        let reply = render_reply("Result: [VIZ:viz_deadbeef.png] done", &store);
        assert_eq!(reply.text, "Result:  done");
        assert_eq!(
            reply.blocks,
            vec![Block::Missing {
                filename: "viz_deadbeef.png".into()
            }]
        );
        assert_eq!(
            reply.blocks[0].warning().unwrap(),
            "Visualization not found: viz_deadbeef.png"
        );
    }

    #[test]
    fn test_existing_artifact_resolves() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArtifactStore::open(tmp.path()).unwrap();
        let path = store.persist(b"png").unwrap();
        let reference = VizReference::from_path(&path).unwrap();

        let reply = render_reply(&format!("See {}", reference), &store);
        assert_eq!(reply.text, "See ");
        assert_eq!(
            reply.blocks,
            vec![Block::Image {
                filename: reference.filename().to_string(),
                path
            }]
        );
    }
}
