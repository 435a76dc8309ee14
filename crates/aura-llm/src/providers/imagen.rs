use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::LLMError;
use crate::provider::{GeminiClient, ImageGenerator, ImageOutcome};
use crate::transformer::{build_predict_request, parse_predict_response};

/// Text-to-image through the Imagen `predict` endpoint
pub struct GeminiImageGenerator {
    client: Arc<GeminiClient>,
}

impl GeminiImageGenerator {
    pub fn new(client: Arc<GeminiClient>) -> Self {
        Self { client }
    }

    fn describe(error: &LLMError) -> String {
        match error {
            LLMError::MissingCredential(var) => format!(
                "Image generation is unavailable: API key not found in {}.",
                var
            ),
            LLMError::Transform(_) => "No image data received from the image model.".to_string(),
            other => format!("Image generation failed: {}", other),
        }
    }
}

#[async_trait]
impl ImageGenerator for GeminiImageGenerator {
    async fn generate(&self, prompt: &str) -> ImageOutcome {
        let model = &self.client.config().image_model;
        let result = async {
            let data = self
                .client
                .post_model(model, "predict", &build_predict_request(prompt))
                .await?;
            Ok::<_, LLMError>(parse_predict_response(&data)?)
        }
        .await;

        match result {
            Ok(image_url) => {
                info!("Generated image with {}", model);
                ImageOutcome::Generated {
                    image_url,
                    alt_text: None,
                }
            }
            Err(e) => {
                warn!("Image generation failed: {}", e);
                ImageOutcome::Failed {
                    error: Self::describe(&e),
                }
            }
        }
    }
}
