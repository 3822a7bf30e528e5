use crate::error::{AppError, AppResult};
use crate::external::{ApiClient, NO_QUERY};
use crate::models::*;

const BANNER_MIME_TYPES: [(&str, &str); 4] = [
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("webp", "image/webp"),
];

#[derive(Clone)]
pub struct ShowService {
    api: ApiClient,
}

impl ShowService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn list(&self) -> AppResult<Listing<Show>> {
        self.api.get_list("/shows", NO_QUERY).await
    }

    pub async fn get(&self, show_id: &str) -> AppResult<Show> {
        self.api.get(&format!("/shows/{show_id}")).await
    }

    pub async fn create(&self, input: &ShowInput) -> AppResult<Show> {
        input.validate()?;
        let show: Show = self.api.post("/shows", input).await?;
        log::info!("Show {} created: {}", show.id, show.title);
        Ok(show)
    }

    /// Replaces the whole record; fields left out of `input` are cleared.
    pub async fn update(&self, show_id: &str, input: &ShowInput) -> AppResult<Show> {
        input.validate()?;
        let show: Show = self.api.put(&format!("/shows/{show_id}"), input).await?;
        log::info!("Show {} updated", show.id);
        Ok(show)
    }

    pub async fn delete(&self, show_id: &str) -> AppResult<()> {
        self.api.delete(&format!("/shows/{show_id}")).await?;
        log::info!("Show {show_id} deleted");
        Ok(())
    }

    /// Upload a banner image and point the show at the hosted copy.
    pub async fn upload_banner(&self, show_id: &str, file_name: &str, bytes: Vec<u8>) -> AppResult<Show> {
        let mime = banner_mime_type(file_name)?;
        if bytes.is_empty() {
            return Err(AppError::ValidationError("Banner image is empty".to_string()));
        }

        let show = self.get(show_id).await?;
        let uploaded = self.api.upload("/upload", file_name, bytes, mime).await?;
        log::info!("Banner for show {show_id} uploaded to {}", uploaded.url);

        let mut input = ShowInput::from(&show);
        input.banner_url = Some(uploaded.url);
        self.update(show_id, &input).await
    }
}

pub fn banner_mime_type(file_name: &str) -> AppResult<&'static str> {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    BANNER_MIME_TYPES
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, mime)| *mime)
        .ok_or_else(|| {
            AppError::ValidationError(format!(
                "Unsupported banner format: {file_name} (png, jpg, webp)"
            ))
        })
}
