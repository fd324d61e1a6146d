use serde::{Deserialize, Serialize};

use super::normalize::RecognizedFood;

#[derive(Debug, Deserialize)]
pub struct RecognizeBase64Request {
    pub image_base64: String,
    /// File extension or image format, defaults to jpeg.
    #[serde(default)]
    pub format: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RecognitionData {
    pub foods: Vec<RecognizedFood>,
}
