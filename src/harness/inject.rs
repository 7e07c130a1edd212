//! Source injection.
//!
//! Splices raw user source into a harness template at its single marker.
//! Pure text transform; persisting the unit is the runner's job.

use super::template::{HarnessTemplate, Target, MARKER};
use super::HarnessKind;
use crate::core::error::{HarnessError, HarnessResult};

/// A single compilable unit: the template with the user's source spliced in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationUnit {
    kind: HarnessKind,
    target: Target,
    text: String,
}

impl TranslationUnit {
    pub fn kind(&self) -> HarnessKind {
        self.kind
    }

    pub fn target(&self) -> Target {
        self.target
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

/// Substitute `source` for the template's marker, exactly once.
///
/// The source is inserted verbatim, even if it contains the marker text
/// itself.
pub fn inject(template: &HarnessTemplate, source: &str) -> HarnessResult<TranslationUnit> {
    let (head, tail) = template
        .text()
        .split_once(MARKER)
        .ok_or(HarnessError::TemplateMarkerMissing)?;

    let mut text = String::with_capacity(head.len() + source.len() + tail.len());
    text.push_str(head);
    text.push_str(source);
    text.push_str(tail);

    log::trace!(
        "Injected {} bytes of source into {} template ({:?})",
        source.len(),
        template.kind(),
        template.target()
    );

    Ok(TranslationUnit {
        kind: template.kind(),
        target: template.target(),
        text,
    })
}
