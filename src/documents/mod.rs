//! PDF documents issued from account records: deletion certificates and policy receipts.

pub mod certificate;
pub mod format;
pub mod layout;
mod metrics;
pub mod receipt;
pub mod render;
pub mod style;

use std::sync::Arc;

use bytes::Bytes;
use time::OffsetDateTime;
use tracing::{debug, error};
use uuid::Uuid;

use crate::accounts::User;
use layout::Layout;
use render::{PdfRenderer, Renderer};
use style::StyleSheet;

pub use receipt::consent_id;

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("user {0} has no pending deletion request")]
    MissingDeletionRequest(Uuid),
    #[error("policy version is required")]
    MissingPolicyVersion,
    #[error("document rendering failed: {0}")]
    Rendering(String),
}

/// Assembles and renders documents; cheap to clone and share across requests.
#[derive(Clone)]
pub struct DocumentGenerator {
    organization: String,
    styles: StyleSheet,
    renderer: Arc<dyn Renderer>,
}

impl DocumentGenerator {
    pub fn new(organization: impl Into<String>) -> Self {
        Self::with_renderer(organization, Arc::new(PdfRenderer))
    }

    pub fn with_renderer(organization: impl Into<String>, renderer: Arc<dyn Renderer>) -> Self {
        Self {
            organization: organization.into(),
            styles: StyleSheet::default(),
            renderer,
        }
    }

    pub fn deletion_certificate(&self, user: &User) -> Result<Bytes, DocumentError> {
        let layout =
            certificate::certificate_layout(user, &self.organization, OffsetDateTime::now_utc())?;
        self.render(&layout, user.id)
    }

    pub fn policy_receipt(&self, user: &User, version: &str) -> Result<Bytes, DocumentError> {
        let layout = receipt::receipt_layout(user, version, &self.organization)?;
        self.render(&layout, user.id)
    }

    fn render(&self, layout: &Layout, user_id: Uuid) -> Result<Bytes, DocumentError> {
        match self.renderer.render(layout, &self.styles) {
            Ok(bytes) => {
                debug!(%user_id, title = %layout.title, size = bytes.len(), "document rendered");
                Ok(Bytes::from(bytes))
            }
            Err(e) => {
                error!(%user_id, title = %layout.title, error = %e, "document rendering failed");
                Err(e)
            }
        }
    }
}
