// Data types for the provisioning workflow and its checkpoint payloads

use serde::{Deserialize, Serialize};

/// How many templates one discovery page requests. The reference behavior is
/// best-effort: a catalog reporting at least this many results is logged as
/// possibly truncated but still used.
pub const TEMPLATE_PAGE_LIMIT: u64 = 100;

/// A processing profile from the external catalog. Serialized camelCase so the
/// checkpoint payload matches the catalog's own wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateDescriptor {
    pub id: u64,
    pub name: String,
    pub container: String,
    pub video_codec: String,
    pub audio_codec: String,
    #[serde(default)]
    pub definition: String,
}

impl TemplateDescriptor {
    /// A remux template repackages media without re-encoding: mp4 container
    /// with both codecs set to copy.
    pub fn is_remux(&self) -> bool {
        self.container == "mp4" && self.video_codec == "copy" && self.audio_codec == "copy"
    }

    /// Case-sensitive substring match, mirroring the catalog's naming scheme.
    pub fn is_deprecated(&self) -> bool {
        self.name.contains("Deprecated")
    }
}

/// Query sent to the catalog's template listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateFilter {
    pub template_type: String,
    pub container_type: String,
    pub limit: u64,
    pub offset: u64,
}

impl TemplateFilter {
    /// The fixed discovery filter: preset transcoding templates for video
    /// containers, first page only.
    pub fn preset_video_page() -> Self {
        Self {
            template_type: "Preset".to_string(),
            container_type: "Video".to_string(),
            limit: TEMPLATE_PAGE_LIMIT,
            offset: 0,
        }
    }
}

/// One page of catalog results plus the reported total across all pages.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplatePage {
    pub total: u64,
    pub templates: Vec<TemplateDescriptor>,
}

/// Checkpoint payload for the remux selection step. An empty selection is a
/// valid, successful outcome.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemuxSelection {
    pub template: Option<TemplateDescriptor>,
}

/// Result of one provisioning invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisioningOutcome {
    /// No credentials configured; nothing was attempted.
    Skipped,
    /// All steps done (now or on an earlier invocation).
    Completed {
        remux: Option<TemplateDescriptor>,
    },
}
