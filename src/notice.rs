//! Purpose: Define a stable, structured schema for non-fatal diagnostics.
//! Exports: `Notice`, `NoticeKind`, `notice_json`.
//! Role: Shared contract for load/remove diagnostics and CLI stderr output.
//! Invariants: Notices are non-fatal and never alter in-memory parameter state.
//! Invariants: JSON schema is stable once published; fields are additive-only.
use serde_json::{Map, Value, json};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NoticeKind {
    /// The document names a parameter this bag has not registered.
    UnknownParam,
    /// An entry did not have the shape its parameter's kind expects.
    Mismatch,
    /// A bag was asked to remove an id it does not hold.
    UnknownTarget,
}

impl NoticeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NoticeKind::UnknownParam => "unknown_param",
            NoticeKind::Mismatch => "mismatch",
            NoticeKind::UnknownTarget => "unknown_target",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub param: Option<String>,
    pub message: String,
}

impl Notice {
    pub fn new(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            param: None,
            message: message.into(),
        }
    }

    pub fn with_param(mut self, param: impl Into<String>) -> Self {
        self.param = Some(param.into());
        self
    }
}

pub fn notice_json(notice: &Notice, time: Option<&str>) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(notice.kind.as_str()));
    if let Some(time) = time {
        inner.insert("time".to_string(), json!(time));
    }
    if let Some(param) = &notice.param {
        inner.insert("param".to_string(), json!(param));
    }
    inner.insert("message".to_string(), json!(notice.message));

    let mut outer = Map::new();
    outer.insert("notice".to_string(), Value::Object(inner));
    Value::Object(outer)
}

#[cfg(test)]
mod tests {
    use super::{Notice, NoticeKind, notice_json};

    #[test]
    fn notice_json_has_required_fields() {
        let notice = Notice::new(NoticeKind::UnknownParam, "no parameter named 'gravity'")
            .with_param("gravity");

        let value = notice_json(&notice, Some("2026-02-01T00:00:00Z"));
        let obj = value
            .get("notice")
            .and_then(|v| v.as_object())
            .expect("notice object");

        assert_eq!(
            obj.get("kind").and_then(|v| v.as_str()),
            Some("unknown_param")
        );
        assert_eq!(
            obj.get("time").and_then(|v| v.as_str()),
            Some("2026-02-01T00:00:00Z")
        );
        assert_eq!(obj.get("param").and_then(|v| v.as_str()), Some("gravity"));
        assert_eq!(
            obj.get("message").and_then(|v| v.as_str()),
            Some("no parameter named 'gravity'")
        );
    }

    #[test]
    fn notice_json_omits_absent_fields() {
        let notice = Notice::new(NoticeKind::UnknownTarget, "target #4 not found");
        let value = notice_json(&notice, None);
        let obj = value["notice"].as_object().expect("notice object");
        assert!(obj.get("param").is_none());
        assert!(obj.get("time").is_none());
    }
}
