//! Chat turns from the command line, one-shot or interactive.

use souvenir_conversation::{
    ChatInput, ChatPipeline, ChatReply, HistoryConfig, HistoryWindow, PromptAssembler, Sampling,
    SqlConversationStore,
};
use souvenir_core::ImageInput;
use souvenir_memory::{Extractor, MemoryService, PatternLibrary};
use souvenir_providers::{HttpGenerator, PdfExtractor};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use super::init_common_components;

/// Input parameters for the Chat command strategy.
#[derive(Debug, Clone)]
pub struct ChatArgs {
    /// Conversation to continue (creates new if not provided)
    pub conversation_id: Option<String>,
    /// Single message to send (non-interactive mode)
    pub message: Option<String>,
    pub image: Option<PathBuf>,
    pub pdf: Option<PathBuf>,
}

/// Strategy for executing the Chat command.
#[derive(Debug, Clone, Copy)]
pub struct ChatStrategy;

impl super::CommandStrategy for ChatStrategy {
    type Input = ChatArgs;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let common = init_common_components(None).await?;
        let config = &common.config;

        let generator = HttpGenerator::new(&config.generation.endpoint, &config.generation.model)
            .with_api_key(config.generation.api_key.clone());
        let conversations = SqlConversationStore::new(common.db.clone()).await?;

        let window = HistoryWindow::with_config(
            HistoryConfig::default()
                .with_max_messages(config.history.max_turns)
                .with_max_chars(config.history.max_chars),
        );

        let mut pipeline = ChatPipeline::new(
            Arc::new(generator),
            Arc::new(PdfExtractor),
            Arc::new(conversations),
            PromptAssembler::new(config.generation.system_prompt()).with_window(window),
        )
        .with_sampling(Sampling {
            max_tokens: config.generation.max_tokens,
            temperature: config.generation.temperature,
            top_p: config.generation.top_p,
        })
        .with_max_document_chars(config.documents.max_chars);

        if config.memory.enabled {
            info!("Memory enabled ({:?} scope)", common.memory.scope());
            let mut service = MemoryService::new(common.memory.clone());
            if let Some(path) = &config.memory.patterns {
                service = service.with_extractor(load_patterns(path).await?);
            }
            pipeline = pipeline.with_memory(service);
        }

        let pdf = match &input.pdf {
            Some(path) => Some(tokio::fs::read(path).await.map_err(|e| {
                anyhow::anyhow!("Failed to read PDF {}: {e}", path.display())
            })?),
            None => None,
        };
        let image = input.image.map(ImageInput::Path);

        if input.message.is_some() || pdf.is_some() || image.is_some() {
            let reply = pipeline
                .handle(ChatInput {
                    conversation_id: input.conversation_id,
                    message: input.message.unwrap_or_default(),
                    image,
                    pdf,
                })
                .await?;
            print_reply(&reply);
            info!("Conversation: {}", reply.conversation_id);
        } else {
            run_interactive(&pipeline, input.conversation_id).await?;
        }

        Ok(())
    }
}

async fn load_patterns(path: &Path) -> anyhow::Result<Extractor> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read patterns {}: {e}", path.display()))?;
    let library: PatternLibrary = serde_json::from_str(&raw)?;
    info!(
        "Loaded {} pattern rules from {}",
        library.rules.len(),
        path.display()
    );
    Ok(Extractor::new(&library))
}

fn print_reply(reply: &ChatReply) {
    println!("{}", reply.response);
    if !reply.extracted.is_empty() {
        debug!("Remembered: {:?}", reply.extracted);
    }
}

/// Read messages from stdin until `exit`, keeping one conversation.
async fn run_interactive(
    pipeline: &ChatPipeline,
    mut conversation_id: Option<String>,
) -> anyhow::Result<()> {
    println!("=== souvenir ===");
    println!("Tapez 'exit', 'quit' ou Ctrl+C pour quitter.\n");

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if std::io::stdin().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();

        if matches!(line, "exit" | "quit" | "q") {
            break;
        }
        if line.is_empty() {
            continue;
        }

        match pipeline
            .handle(ChatInput::text(conversation_id.clone(), line))
            .await
        {
            Ok(reply) => {
                println!();
                print_reply(&reply);
                println!();
                conversation_id = Some(reply.conversation_id);
            }
            Err(e) => eprintln!("Error: {e}"),
        }
    }

    if let Some(id) = conversation_id {
        println!("\nConversation: {id}");
    }
    Ok(())
}
