use serde::Deserialize;
use uuid::Uuid;

pub const DEFAULT_USER_ID: Uuid = Uuid::from_u128(1);

#[derive(Debug, Clone, Deserialize)]
pub struct VisionConfig {
    pub api_key: String,
    pub api_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    /// The single implicit user every request acts as.
    pub default_user_id: Uuid,
    /// Calorie goal used when the user has none stored.
    pub daily_calorie_goal: i32,
    pub max_upload_size: usize,
    pub vision: VisionConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let default_user_id = match std::env::var("DEFAULT_USER_ID") {
            Ok(v) => v.parse::<Uuid>()?,
            Err(_) => DEFAULT_USER_ID,
        };
        let vision = VisionConfig {
            api_key: std::env::var("VISION_API_KEY").unwrap_or_default(),
            api_url: std::env::var("VISION_API_URL").unwrap_or_else(|_| {
                "https://dashscope.aliyuncs.com/compatible-mode/v1/chat/completions".into()
            }),
            model: std::env::var("VISION_MODEL").unwrap_or_else(|_| "qwen-vl-plus".into()),
            timeout_secs: std::env::var("VISION_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(30),
        };
        Ok(Self {
            database_url,
            default_user_id,
            daily_calorie_goal: std::env::var("DAILY_CALORIE_GOAL")
                .ok()
                .and_then(|v| v.parse::<i32>().ok())
                .unwrap_or(1200),
            max_upload_size: std::env::var("MAX_UPLOAD_SIZE")
                .ok()
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(5 * 1024 * 1024),
            vision,
        })
    }
}
