//! Purpose: Read, build, and atomically write the backing-file document.
//! Exports: `Document`, `PARAMS_FIELD`.
//! Role: Shape rules for `{"params": {...}}`, shared by the bag and the CLI.
//! Invariants: Writes go to a temp file in the target directory, then rename over the target.
//! Invariants: An empty or whitespace-only file reads as an empty document.
//! Invariants: A missing `params` field or a non-object root is `Corrupt`, never a partial read.
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use serde_json::{Map, Value};

use super::error::{Error, ErrorKind};
use crate::json::parse;

pub const PARAMS_FIELD: &str = "params";

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Document {
    params: Map<String, Value>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses document text. Accepts the canonical object form and the
    /// array-of-named-entries form `{"params": [{"name": value}, ...]}`.
    pub fn parse(text: &str) -> Result<Self, Error> {
        if text.trim().is_empty() {
            return Ok(Self::new());
        }
        let root: Value = parse::from_str(text).map_err(|err| {
            Error::new(ErrorKind::Corrupt)
                .with_message("failed to parse params document")
                .with_hint(parse::hint_for_error(&err, "params document"))
                .with_source(err)
        })?;
        let Value::Object(mut root) = root else {
            return Err(corrupt("params document root must be an object"));
        };
        let params = match root.remove(PARAMS_FIELD) {
            Some(Value::Object(params)) => params,
            Some(Value::Array(items)) => flatten_entries(items)?,
            Some(_) => return Err(corrupt("'params' must be an object or an array")),
            None => return Err(corrupt("params document has no 'params' field")),
        };
        Ok(Self { params })
    }

    /// Reads `path`; `Ok(None)` when the file does not exist.
    pub fn read(path: &Path) -> Result<Option<Self>, Error> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) if err.kind() == io::ErrorKind::InvalidData => {
                return Err(Error::new(ErrorKind::Corrupt)
                    .with_message("params document is not valid UTF-8")
                    .with_path(path)
                    .with_source(err));
            }
            Err(err) => return Err(Error::io(err, path, "failed to read params document")),
        };
        Self::parse(&text)
            .map(Some)
            .map_err(|err| err.with_path(path))
    }

    pub fn insert(&mut self, name: impl Into<String>, node: Value) -> Option<Value> {
        self.params.insert(name.into(), node)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.params.remove(name)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.params.iter().map(|(name, node)| (name.as_str(), node))
    }

    pub fn params_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.params
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn to_json(&self) -> Value {
        let mut root = Map::new();
        root.insert(PARAMS_FIELD.to_string(), Value::Object(self.params.clone()));
        Value::Object(root)
    }

    pub fn to_pretty_string(&self) -> Result<String, Error> {
        let mut text = serde_json::to_string_pretty(&self.to_json()).map_err(|err| {
            Error::new(ErrorKind::Internal)
                .with_message("failed to encode params document")
                .with_source(err)
        })?;
        text.push('\n');
        Ok(text)
    }

    /// Replaces `path` with this document. Readers see either the old file
    /// or the new one; a failed write leaves the old file in place.
    pub fn write_atomic(&self, path: &Path) -> Result<(), Error> {
        let text = self.to_pretty_string()?;
        let dir = path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut temp = tempfile::Builder::new()
            .prefix(".live_params")
            .suffix(".tmp")
            .tempfile_in(dir)
            .map_err(|err| Error::io(err, dir, "failed to create temp file"))?;
        if let Ok(meta) = fs::metadata(path) {
            let _ = temp.as_file().set_permissions(meta.permissions());
        }
        temp.write_all(text.as_bytes())
            .and_then(|()| temp.as_file().sync_all())
            .map_err(|err| Error::io(err, temp.path(), "failed to write temp file"))?;
        temp.persist(path)
            .map_err(|err| Error::io(err.error, path, "failed to replace params document"))?;
        Ok(())
    }
}

fn flatten_entries(items: Vec<Value>) -> Result<Map<String, Value>, Error> {
    let mut params = Map::new();
    for item in items {
        let Value::Object(entry) = item else {
            return Err(corrupt("'params' array items must be objects"));
        };
        for (name, node) in entry {
            params.insert(name, node);
        }
    }
    Ok(params)
}

fn corrupt(message: &str) -> Error {
    Error::new(ErrorKind::Corrupt).with_message(message)
}

#[cfg(test)]
mod tests {
    use super::Document;
    use crate::core::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn empty_text_is_empty_document() {
        assert!(Document::parse("").expect("empty").is_empty());
        assert!(Document::parse("  \n").expect("blank").is_empty());
    }

    #[test]
    fn object_form_keeps_entry_order() {
        let doc = Document::parse(r#"{"params": {"springk": "0.1", "friction": "0.9"}}"#)
            .expect("parse");
        let names: Vec<&str> = doc.entries().map(|(name, _)| name).collect();
        assert_eq!(names, ["springk", "friction"]);
    }

    #[test]
    fn array_form_is_flattened() {
        let doc = Document::parse(
            r#"{"params": [{"friction": "0.9"}, {"disk_color": {"r": "1", "g": "0", "b": "0"}}]}"#,
        )
        .expect("parse");
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.get("friction"), Some(&json!("0.9")));
        assert_eq!(doc.get("disk_color").expect("color")["r"], json!("1"));
    }

    #[test]
    fn malformed_documents_are_corrupt() {
        for text in [
            "{not json",
            "[1, 2]",
            r#"{"other": {}}"#,
            r#"{"params": "0.9"}"#,
            r#"{"params": ["0.9"]}"#,
        ] {
            let err = Document::parse(text).expect_err(text);
            assert_eq!(err.kind(), ErrorKind::Corrupt, "{text}");
        }
    }

    #[test]
    fn syntax_errors_carry_a_hint() {
        let err = Document::parse(r#"{"params": }"#).expect_err("syntax");
        assert!(err.hint().expect("hint").contains("parse category: syntax"));
    }

    #[test]
    fn read_missing_file_is_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let read = Document::read(&dir.path().join("live_params.json")).expect("read");
        assert!(read.is_none());
    }

    #[test]
    fn write_atomic_replaces_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("live_params.json");
        std::fs::write(&path, "old contents").expect("seed");

        let mut doc = Document::new();
        doc.insert("friction", json!("0.9"));
        doc.write_atomic(&path).expect("write");

        let text = std::fs::read_to_string(&path).expect("read back");
        assert!(text.ends_with('\n'));
        let reread = Document::read(&path).expect("read").expect("present");
        assert_eq!(reread, doc);

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .expect("list")
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name() != "live_params.json")
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn read_errors_carry_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("live_params.json");
        std::fs::write(&path, "{broken").expect("seed");
        let err = Document::read(&path).expect_err("corrupt");
        assert_eq!(err.kind(), ErrorKind::Corrupt);
        assert_eq!(err.path(), Some(path.as_path()));
    }
}
