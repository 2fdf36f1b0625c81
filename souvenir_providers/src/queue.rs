use async_trait::async_trait;
use souvenir_core::{GenerationOutput, GenerationRequest, TextGenerator};
use tokio::sync::Mutex;
use tracing::debug;

/// Runs one generation at a time on the wrapped generator.
///
/// The model runtime is not reentrant; concurrent callers wait their turn.
pub struct GenerationQueue<G> {
    inner: G,
    lock: Mutex<()>,
}

impl<G: TextGenerator> GenerationQueue<G> {
    pub fn new(inner: G) -> Self {
        Self {
            inner,
            lock: Mutex::new(()),
        }
    }

    pub const fn inner(&self) -> &G {
        &self.inner
    }
}

#[async_trait]
impl<G: TextGenerator> TextGenerator for GenerationQueue<G> {
    async fn generate(&self, request: &GenerationRequest) -> anyhow::Result<GenerationOutput> {
        let _turn = match self.lock.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                debug!("Generation in progress, waiting in queue");
                self.lock.lock().await
            }
        };
        self.inner.generate(request).await
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}
