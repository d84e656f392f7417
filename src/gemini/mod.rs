pub mod image_client;
pub mod traits;

use crate::{
    config::GeminiConfig,
    error::Result,
    models::{EditRequest, EditedImage},
};
use async_trait::async_trait;
use reqwest::Client;

pub use image_client::ImageClient;
pub use traits::ImageEditor;

/// Gemini-backed [`ImageEditor`].
#[derive(Clone)]
pub struct GeminiClient {
    image_client: ImageClient,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let client = Client::new();

        Ok(Self {
            image_client: ImageClient::new(client, &config)?,
        })
    }

    pub fn image(&self) -> &ImageClient {
        &self.image_client
    }
}

#[async_trait]
impl ImageEditor for GeminiClient {
    async fn edit(&self, request: &EditRequest) -> Result<EditedImage> {
        self.image_client.edit(request).await
    }
}
