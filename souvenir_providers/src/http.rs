use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use serde_json::json;
use souvenir_core::{GenerationOutput, GenerationRequest, ImageInput, TextGenerator};
use tracing::{debug, info};

use crate::retry::RetryPolicy;

/// Text generator behind an OpenAI-compatible `/completions` endpoint,
/// e.g. a local `mlx_vlm.server` or llama.cpp server.
pub struct HttpGenerator {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    retry: RetryPolicy,
}

impl HttpGenerator {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let model = model.into();
        info!("Creating HttpGenerator for {model} at {base_url}");
        Self {
            client: Client::new(),
            base_url,
            api_key: None,
            model,
            retry: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|key| !key.is_empty());
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn body(&self, request: &GenerationRequest) -> anyhow::Result<serde_json::Value> {
        let mut body = json!({
            "model": self.model,
            "prompt": request.prompt,
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
            "top_p": request.top_p,
        });

        if let Some(image) = &request.image {
            body["images"] = json!([encode_image(image).await?]);
        }
        Ok(body)
    }

    async fn try_send(&self, body: &serde_json::Value) -> anyhow::Result<GenerationOutput> {
        let mut request = self
            .client
            .post(format!("{}/completions", self.base_url))
            .json(body);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request
            .send()
            .await?
            .error_for_status()?
            .json::<serde_json::Value>()
            .await?;

        let generated_text = response["choices"][0]["text"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Invalid response format: missing text"))?
            .to_string();

        Ok(GenerationOutput { generated_text })
    }
}

/// `data:` URL for an attached image.
async fn encode_image(image: &ImageInput) -> anyhow::Result<String> {
    let (mime, bytes) = match image {
        ImageInput::Path(path) => {
            let bytes = tokio::fs::read(path)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to read image {}: {e}", path.display()))?;
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            (mime.essence_str().to_string(), bytes)
        }
        ImageInput::Bytes(bytes) => ("image/png".to_string(), bytes.clone()),
    };
    Ok(format!("data:{mime};base64,{}", STANDARD.encode(bytes)))
}

#[async_trait]
impl TextGenerator for HttpGenerator {
    async fn generate(&self, request: &GenerationRequest) -> anyhow::Result<GenerationOutput> {
        let body = self.body(request).await?;

        info!(
            "Sending generation request: model={}, max_tokens={}, image={}",
            self.model,
            request.max_tokens,
            request.image.is_some()
        );

        let output = self.retry.run(|| self.try_send(&body)).await?;

        debug!("Received {} characters", output.generated_text.len());
        Ok(output)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
