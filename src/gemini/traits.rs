use crate::{
    error::Result,
    models::{EditRequest, EditedImage},
};
use async_trait::async_trait;

/// The remote service that applies a masked, prompted edit.
///
/// Called once per submission; the outcome is either the edited image or an
/// error whose message is shown to the user unchanged.
#[async_trait]
pub trait ImageEditor: Send + Sync {
    async fn edit(&self, request: &EditRequest) -> Result<EditedImage>;
}
