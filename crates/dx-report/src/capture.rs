//! Captured views handed to the assembler.

use chrono::{DateTime, Utc};
use dx_common::ViewId;
use serde::{Deserialize, Serialize};

/// What a capture produced for one view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CaptureContent {
    /// Cloned, post-processed markup and the CSS that styles it.
    Captured {
        markup: String,
        style_fragment: String,
    },
    /// The view could not be captured.
    Placeholder { reason: String },
}

/// One opened-and-captured view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapturedView {
    pub view_id: ViewId,
    pub content: CaptureContent,
    pub captured_at: DateTime<Utc>,
}

impl CapturedView {
    pub fn captured(
        view_id: ViewId,
        markup: impl Into<String>,
        style_fragment: impl Into<String>,
    ) -> Self {
        Self {
            view_id,
            content: CaptureContent::Captured {
                markup: markup.into(),
                style_fragment: style_fragment.into(),
            },
            captured_at: Utc::now(),
        }
    }

    pub fn placeholder(view_id: ViewId, reason: impl Into<String>) -> Self {
        Self {
            view_id,
            content: CaptureContent::Placeholder {
                reason: reason.into(),
            },
            captured_at: Utc::now(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self.content, CaptureContent::Placeholder { .. })
    }

    pub fn markup(&self) -> Option<&str> {
        match &self.content {
            CaptureContent::Captured { markup, .. } => Some(markup),
            CaptureContent::Placeholder { .. } => None,
        }
    }

    pub fn style_fragment(&self) -> Option<&str> {
        match &self.content {
            CaptureContent::Captured { style_fragment, .. } => Some(style_fragment),
            CaptureContent::Placeholder { .. } => None,
        }
    }
}
