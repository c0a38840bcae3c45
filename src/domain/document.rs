use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TemplateKind {
    Invoice,
    Recipe,
    Order,
}

/// What the caller wants the artifact for. Drives both billing and the
/// `Content-Disposition` of the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestIntent {
    Preview,
    Download,
}

impl RequestIntent {
    pub fn from_preview_flag(is_preview: bool) -> Self {
        if is_preview {
            RequestIntent::Preview
        } else {
            RequestIntent::Download
        }
    }

    pub fn is_preview(self) -> bool {
        matches!(self, RequestIntent::Preview)
    }
}

/// Output of the external renderer: the artifact plus its true cost.
#[derive(Debug, Clone)]
pub struct RenderedPdf {
    pub bytes: Vec<u8>,
    pub page_count: i32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn template_kind_parses_wire_names() {
        assert_eq!(TemplateKind::from_str("invoice").unwrap(), TemplateKind::Invoice);
        assert_eq!(TemplateKind::from_str("recipe").unwrap(), TemplateKind::Recipe);
        assert_eq!(TemplateKind::from_str("order").unwrap(), TemplateKind::Order);
        assert!(TemplateKind::from_str("certificate").is_err());
    }

    #[test]
    fn intent_tracks_preview_flag() {
        assert!(RequestIntent::from_preview_flag(true).is_preview());
        assert!(!RequestIntent::from_preview_flag(false).is_preview());
    }
}
