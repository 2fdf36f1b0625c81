//! One chat turn end to end.
//!
//! extract facts -> update memory -> recall memory -> assemble prompt ->
//! generate -> clean -> persist transcript.

use serde::Serialize;
use souvenir_core::{
    ChatMessage, ConversationStore, DEFAULT_IMAGE_QUESTION, DEFAULT_PDF_QUESTION,
    GENERATION_ERROR_PREFIX,
    GenerationRequest, ImageInput, NewMessage, Role, TextExtractor, TextGenerator,
};
use souvenir_memory::{Extraction, MemoryService};
use souvenir_providers::{GenerationQueue, clean_response, truncate_with_marker};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::ConversationError;
use crate::prompt::PromptAssembler;

/// Characters of the first message kept as a conversation title.
const TITLE_CHARS: usize = 40;

/// Sampling parameters forwarded with every generation request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sampling {
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
}

impl Default for Sampling {
    fn default() -> Self {
        Self {
            max_tokens: 250,
            temperature: 0.7,
            top_p: 0.9,
        }
    }
}

/// One inbound chat request.
#[derive(Debug, Clone, Default)]
pub struct ChatInput {
    /// A fresh id is generated when absent.
    pub conversation_id: Option<String>,
    pub message: String,
    pub image: Option<ImageInput>,
    /// Raw PDF bytes; the message becomes the question about the document.
    pub pdf: Option<Vec<u8>>,
}

impl ChatInput {
    #[must_use]
    pub fn text(conversation_id: Option<String>, message: impl Into<String>) -> Self {
        Self {
            conversation_id,
            message: message.into(),
            ..Self::default()
        }
    }
}

/// Result of a turn. Generation failures still produce a reply whose
/// `response` explains the failure and whose `error` holds the details.
#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub conversation_id: String,
    pub response: String,
    pub extracted: Extraction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub struct ChatPipeline {
    generator: GenerationQueue<Arc<dyn TextGenerator>>,
    documents: Arc<dyn TextExtractor>,
    conversations: Arc<dyn ConversationStore>,
    memory: Option<MemoryService>,
    assembler: PromptAssembler,
    sampling: Sampling,
    max_document_chars: usize,
}

impl ChatPipeline {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        documents: Arc<dyn TextExtractor>,
        conversations: Arc<dyn ConversationStore>,
        assembler: PromptAssembler,
    ) -> Self {
        Self {
            generator: GenerationQueue::new(generator),
            documents,
            conversations,
            memory: None,
            assembler,
            sampling: Sampling::default(),
            max_document_chars: 8000,
        }
    }

    #[must_use]
    pub fn with_memory(mut self, memory: MemoryService) -> Self {
        self.memory = Some(memory);
        self
    }

    #[must_use]
    pub const fn with_sampling(mut self, sampling: Sampling) -> Self {
        self.sampling = sampling;
        self
    }

    #[must_use]
    pub const fn with_max_document_chars(mut self, max_chars: usize) -> Self {
        self.max_document_chars = max_chars;
        self
    }

    #[must_use]
    pub const fn memory(&self) -> Option<&MemoryService> {
        self.memory.as_ref()
    }

    #[must_use]
    pub fn conversations(&self) -> &dyn ConversationStore {
        self.conversations.as_ref()
    }

    pub async fn handle(&self, input: ChatInput) -> Result<ChatReply, ConversationError> {
        let ChatInput {
            conversation_id,
            message,
            image,
            pdf,
        } = input;

        let conversation_id = conversation_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| Uuid::now_v7().to_string());

        let (prompt_message, transcript_message) = match pdf {
            Some(bytes) => self.document_turn(&bytes, &message)?,
            None if message.trim().is_empty() => match image {
                Some(_) => (
                    DEFAULT_IMAGE_QUESTION.to_string(),
                    DEFAULT_IMAGE_QUESTION.to_string(),
                ),
                None => return Err(ConversationError::EmptyMessage),
            },
            None => (message.clone(), message.clone()),
        };

        info!("Handling chat turn for conversation {conversation_id}");

        let (extracted, memory_context) = match &self.memory {
            Some(memory) => (
                memory.process_user_message(&conversation_id, &message).await,
                memory.conversation_context(&conversation_id).await,
            ),
            None => (Extraction::default(), String::new()),
        };

        let history: Vec<ChatMessage> = self
            .conversations
            .messages(&conversation_id)
            .await
            .map_err(ConversationError::Storage)?
            .iter()
            .map(ChatMessage::from)
            .collect();

        let prompt = self
            .assembler
            .assemble(&memory_context, &history, &prompt_message);

        let mut request = GenerationRequest::new(prompt).with_sampling(
            self.sampling.max_tokens,
            self.sampling.temperature,
            self.sampling.top_p,
        );
        if let Some(image) = image {
            request = request.with_image(image);
        }

        let (response, failure) = match self.generator.generate(&request).await {
            Ok(output) => (clean_response(&output.generated_text), None),
            Err(e) => {
                error!("Generation failed for conversation {conversation_id}: {e}");
                (
                    format!("{GENERATION_ERROR_PREFIX} Détails: {e}"),
                    Some(e.to_string()),
                )
            }
        };

        self.persist_turn(&conversation_id, &transcript_message, &response)
            .await?;

        Ok(ChatReply {
            conversation_id,
            response,
            extracted,
            error: failure,
        })
    }

    /// Prompt text and transcript text for a question about a PDF.
    fn document_turn(&self, bytes: &[u8], question: &str) -> Result<(String, String), ConversationError> {
        let text = self
            .documents
            .extract_pdf(bytes)
            .map_err(ConversationError::Document)?;
        let text = truncate_with_marker(&text, self.max_document_chars);

        let question = if question.trim().is_empty() {
            DEFAULT_PDF_QUESTION
        } else {
            question
        };

        Ok((
            format!("Voici le contenu d'un document PDF:\n\n{text}\n\n{question}"),
            format!("[PDF] {question}"),
        ))
    }

    async fn persist_turn(
        &self,
        conversation_id: &str,
        user_text: &str,
        response: &str,
    ) -> Result<(), ConversationError> {
        let exists = self
            .conversations
            .get(conversation_id)
            .await
            .map_err(ConversationError::Storage)?
            .is_some();

        if !exists {
            let title = title_from_message(user_text);
            self.conversations
                .create(conversation_id, &title)
                .await
                .map_err(ConversationError::Storage)?;
            if let Some(memory) = &self.memory {
                if memory.store().scope() == souvenir_core::MemoryScope::Conversation {
                    if let Err(e) = memory.store().set_title(conversation_id, &title).await {
                        warn!("Could not title memory record {conversation_id}: {e}");
                    }
                }
            }
        }

        for (role, text) in [(Role::User, user_text), (Role::Assistant, response)] {
            self.conversations
                .add_message(
                    conversation_id,
                    NewMessage {
                        message_id: Uuid::now_v7().to_string(),
                        role,
                        text: text.to_string(),
                    },
                )
                .await
                .map_err(ConversationError::Storage)?;
        }
        Ok(())
    }
}

/// First line of the message, cut to a title-sized prefix.
#[must_use]
pub fn title_from_message(message: &str) -> String {
    let line = message.lines().next().unwrap_or_default().trim();
    if line.is_empty() {
        return "Nouvelle conversation".to_string();
    }
    match line.char_indices().nth(TITLE_CHARS) {
        Some((cut, _)) => format!("{}...", line[..cut].trim_end()),
        None => line.to_string(),
    }
}
