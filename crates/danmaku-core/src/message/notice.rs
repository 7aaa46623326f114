//! `COMMON_NOTICE_DANMAKU`: a system notice rendered as a chat line.
//!
//! Not one of the typed event kinds.  It is offered for custom handlers, which
//! receive the raw body and can decode it with [`CommonNoticeDanmaku::parse`].
//! Like the typed records, every field decodes on its own: a mistyped value
//! becomes zero without discarding its neighbours.

use serde::{Deserialize, Serialize};

use crate::message::path::JsonView;

/// One styled piece of a notice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentSegment {
    pub font_color: String,
    pub text: String,
    #[serde(rename = "type")]
    pub segment_type: i64,
}

/// A decoded system notice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommonNoticeDanmaku {
    pub content_segments: Vec<ContentSegment>,
    pub dmscore: i64,
    pub terminals: Vec<i64>,
}

impl CommonNoticeDanmaku {
    /// Decodes the `data` object of the notice.  Never fails.
    pub fn parse(body: &[u8]) -> Self {
        Self::from_view(&JsonView::parse(body))
    }

    pub fn from_view(v: &JsonView) -> Self {
        let segments = array_len(v, "data.content_segments");
        let terminals = array_len(v, "data.terminals");
        Self {
            content_segments: (0..segments)
                .map(|i| ContentSegment {
                    font_color: v.get(&format!("data.content_segments.{i}.font_color")).string(),
                    text: v.get(&format!("data.content_segments.{i}.text")).string(),
                    segment_type: v.get(&format!("data.content_segments.{i}.type")).int(),
                })
                .collect(),
            dmscore: v.get("data.dmscore").int(),
            terminals: (0..terminals)
                .map(|i| v.get(&format!("data.terminals.{i}")).int())
                .collect(),
        }
    }

    /// Concatenated text of all segments.
    pub fn text(&self) -> String {
        self.content_segments.iter().map(|s| s.text.as_str()).collect()
    }
}

fn array_len(v: &JsonView, path: &str) -> usize {
    v.get(path)
        .value()
        .and_then(|value| value.as_array())
        .map_or(0, Vec::len)
}
