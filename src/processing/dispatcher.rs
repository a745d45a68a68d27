use crate::config::Config;
use crate::error::{Result, SplitterError};
use crate::processing::types::{ImageSource, ProcessingParameters, FIELD_FILE};
use crate::processing::ProcessingService;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use std::sync::Arc;
use tracing::{error, info};

/// Sends one image plus its parameters to the processing endpoint and hands
/// back the raw archive.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    api_url: String,
}

impl Dispatcher {
    pub fn new(config: &Config) -> Self {
        Self {
            api_url: config.api_url.clone(),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub async fn send(
        &self,
        image: &ImageSource,
        params: &ProcessingParameters,
    ) -> Result<Arc<[u8]>> {
        let form = Self::build_form(image, params)?;

        info!(
            "Sending '{}' to {} ({}x{}, stripes: {}, stripe height: {})",
            image.name,
            self.api_url,
            params.rows(),
            params.columns(),
            params.stripes(),
            params.stripe_height()
        );

        let client = reqwest::Client::new();
        let response = client.post(&self.api_url).multipart(form).send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            error!("Processing request failed with status: {}", status);
            return Err(SplitterError::Status(status));
        }

        let body = response.bytes().await?;
        info!("Received {} byte archive", body.len());
        Ok(Arc::from(&body[..]))
    }

    fn build_form(image: &ImageSource, params: &ProcessingParameters) -> Result<Form> {
        let file = Part::bytes(image.bytes.to_vec())
            .file_name(image.name.clone())
            .mime_str(&image.mime)?;

        let mut form = Form::new().part(FIELD_FILE, file);
        for (name, value) in params.form_fields() {
            form = form.text(name, value);
        }
        Ok(form)
    }
}

impl ProcessingService for Dispatcher {
    fn fetch(&self, image: &ImageSource, params: &ProcessingParameters) -> Result<Arc<[u8]>> {
        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(self.send(image, params))
    }
}
