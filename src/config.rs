use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub api_key: String,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub dir: PathBuf,
    pub max_upload_bytes: usize,
    pub max_image_px: u32,
    pub jpeg_quality: u8,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub analysis: AnalysisConfig,
    pub upload: UploadConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let analysis = AnalysisConfig {
            api_key: std::env::var("OPENAI_API_KEY")?,
            model: std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o".into()),
            timeout_secs: std::env::var("OPENAI_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(30),
        };
        let upload = UploadConfig {
            dir: std::env::var("UPLOAD_DIR")
                .unwrap_or_else(|_| "uploaded_images".into())
                .into(),
            max_upload_bytes: std::env::var("MAX_UPLOAD_BYTES")
                .ok()
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(10 * 1024 * 1024),
            max_image_px: std::env::var("MAX_IMAGE_PX")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(800),
            jpeg_quality: std::env::var("JPEG_QUALITY")
                .ok()
                .and_then(|v| v.parse::<u8>().ok())
                .unwrap_or(85),
        };
        Ok(Self {
            database_url,
            analysis,
            upload,
        })
    }
}
