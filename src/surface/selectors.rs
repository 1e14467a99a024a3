//! Structural selector contract honored by the HTML producer.

use serde::{Deserialize, Serialize};

use crate::model::ItemKind;

/// CSS selectors identifying the structural units of a resume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Selectors {
    /// Root element of the resume
    pub container: String,
    /// Named block inside the container
    pub section: String,
    /// Resume header (name, contact line)
    pub header: String,
    /// Heading element inside a section
    pub heading: String,
    pub experience: String,
    pub education: String,
    pub project: String,
    pub certificate: String,
    pub skill: String,
}

impl Selectors {
    /// Create the default selector set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the container selector.
    pub fn with_container(mut self, selector: impl Into<String>) -> Self {
        self.container = selector.into();
        self
    }

    /// Set the section selector.
    pub fn with_section(mut self, selector: impl Into<String>) -> Self {
        self.section = selector.into();
        self
    }

    /// Set the header selector.
    pub fn with_header(mut self, selector: impl Into<String>) -> Self {
        self.header = selector.into();
        self
    }

    /// Selector for one item kind.
    pub fn item(&self, kind: ItemKind) -> &str {
        match kind {
            ItemKind::Experience => &self.experience,
            ItemKind::Education => &self.education,
            ItemKind::Project => &self.project,
            ItemKind::Certificate => &self.certificate,
            ItemKind::Skill => &self.skill,
        }
    }
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            container: ".resume-container".into(),
            section: ".resume-section".into(),
            header: ".resume-header".into(),
            heading: "h2".into(),
            experience: ".experience-item".into(),
            education: ".education-item".into(),
            project: ".project-item".into(),
            certificate: ".certificate-item".into(),
            skill: ".skill-item".into(),
        }
    }
}
