use bytes::Bytes;
use serde::Serialize;
use tracing::{info, warn};

use super::client::{VisionClient, VisionError};
use super::normalize::{try_extract, RecognizedFood};

/// Result handed back to the upload endpoint. Failures never carry a partial
/// list.
#[derive(Debug, Serialize, PartialEq)]
pub struct RecognitionOutcome {
    pub success: bool,
    pub foods: Vec<RecognizedFood>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RecognitionOutcome {
    fn failed(error: String) -> Self {
        Self {
            success: false,
            foods: Vec::new(),
            error: Some(error),
        }
    }
}

pub async fn recognize_food(
    vision: &dyn VisionClient,
    image: Bytes,
    format: &str,
) -> RecognitionOutcome {
    let reply = match vision.describe(image, format).await {
        Ok(text) => text,
        Err(VisionError::MissingContent) => {
            warn!("model reply had no message content");
            return RecognitionOutcome::failed(format!(
                "recognition failed: {}",
                VisionError::MissingContent
            ));
        }
        Err(e) => {
            warn!(error = %e, "vision request failed");
            return RecognitionOutcome::failed(format!("request failed: {e}"));
        }
    };

    match try_extract(&reply) {
        Some(foods) => {
            info!(count = foods.len(), "foods recognized");
            RecognitionOutcome {
                success: true,
                foods,
                error: None,
            }
        }
        None => {
            warn!(reply_len = reply.len(), "model reply could not be parsed");
            RecognitionOutcome::failed(
                "recognition failed: no food list could be extracted from the model reply".into(),
            )
        }
    }
}

/// Maps an upload's file extension to the image format sent upstream.
pub fn image_format(extension: &str) -> Option<&'static str> {
    match extension.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("jpeg"),
        "png" => Some("png"),
        "webp" => Some("webp"),
        _ => None,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;

    /// Replies with a canned string or fails with a timeout.
    pub struct FakeVision(pub Option<String>);

    #[async_trait]
    impl VisionClient for FakeVision {
        async fn describe(&self, _image: Bytes, _format: &str) -> Result<String, VisionError> {
            self.0.clone().ok_or(VisionError::Timeout)
        }
    }

    #[tokio::test]
    async fn successful_reply_is_normalized() {
        let vision = FakeVision(Some(r#"{"foods": [{"name": "rice"}]}"#.into()));
        let out = recognize_food(&vision, Bytes::from_static(b"img"), "jpeg").await;
        assert!(out.success);
        assert_eq!(out.foods.len(), 1);
        assert!(out.error.is_none());
    }

    #[tokio::test]
    async fn unparseable_reply_is_a_content_failure() {
        let vision = FakeVision(Some("Looks tasty!".into()));
        let out = recognize_food(&vision, Bytes::from_static(b"img"), "jpeg").await;
        assert!(!out.success);
        assert!(out.foods.is_empty());
        assert!(out.error.unwrap().starts_with("recognition failed"));
    }

    #[tokio::test]
    async fn timeout_is_a_request_failure() {
        let out = recognize_food(&FakeVision(None), Bytes::from_static(b"img"), "png").await;
        assert!(!out.success);
        assert!(out.foods.is_empty());
        assert_eq!(out.error.as_deref(), Some("request failed: request timed out"));
    }

    struct EmptyReply;

    #[async_trait]
    impl VisionClient for EmptyReply {
        async fn describe(&self, _image: Bytes, _format: &str) -> Result<String, VisionError> {
            Err(VisionError::MissingContent)
        }
    }

    #[tokio::test]
    async fn reply_without_content_is_a_content_failure() {
        let out = recognize_food(&EmptyReply, Bytes::from_static(b"img"), "jpeg").await;
        assert!(!out.success);
        assert!(out.foods.is_empty());
        assert_eq!(
            out.error.as_deref(),
            Some("recognition failed: reply has no message content")
        );
    }

    #[test]
    fn image_format_by_extension() {
        assert_eq!(image_format("JPG"), Some("jpeg"));
        assert_eq!(image_format("jpeg"), Some("jpeg"));
        assert_eq!(image_format("webp"), Some("webp"));
        assert_eq!(image_format("gif"), None);
    }
}
