use clap::Subcommand;
use souvenir_core::MemoryScope;
use souvenir_memory::{GLOBAL_RECORD_KEY, MemoryRecord, default_extractor, format_context};

use super::init_common_components;

#[derive(Debug, Clone, Subcommand)]
pub enum MemoryAction {
    /// List every conversation memory record
    List,
    /// Show one record and the prompt context it renders to
    Show {
        /// Conversation id (not needed with --global)
        id: Option<String>,
    },
    /// Remember a fact
    Set {
        category: String,
        value: String,
        #[arg(short = 'c', long = "conversation")]
        id: Option<String>,
    },
    /// Forget a fact
    Forget {
        category: String,
        #[arg(short = 'c', long = "conversation")]
        id: Option<String>,
    },
    /// Forget every fact of a record
    Clear {
        /// Conversation id (not needed with --global)
        id: Option<String>,
    },
    /// Show what would be extracted from a message, without storing it
    Extract { text: String },
}

#[derive(Debug, Clone)]
pub struct MemoryArgs {
    pub global: bool,
    pub action: MemoryAction,
}

/// Strategy for the `memory` command family.
#[derive(Debug, Clone, Copy)]
pub struct MemoryStrategy;

impl super::CommandStrategy for MemoryStrategy {
    type Input = MemoryArgs;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        if let MemoryAction::Extract { text } = &input.action {
            let extraction = default_extractor().extract(text);
            println!("{}", serde_json::to_string_pretty(&extraction)?);
            return Ok(());
        }

        let scope = input.global.then_some(MemoryScope::Global);
        let common = init_common_components(scope).await?;
        let store = &common.memory;
        let resolve = |id: Option<String>| record_id(input.global, id);

        match input.action {
            MemoryAction::List => {
                let records = store.list_all().await?;
                if records.is_empty() {
                    println!("No memory records.");
                }
                for (id, record) in &records {
                    println!(
                        "{id}  {}  ({} facts, updated {})",
                        record.title.as_deref().unwrap_or("-"),
                        record.memories.len(),
                        record.updated_at.format("%Y-%m-%d %H:%M")
                    );
                }
            }
            MemoryAction::Show { id } => {
                let record = store.load(&resolve(id)?).await?;
                print_record(&record)?;
            }
            MemoryAction::Set {
                category,
                value,
                id,
            } => {
                let record = store.upsert_fact(&resolve(id)?, &category, &value).await?;
                println!("✅ {category} = {value}");
                print_record(&record)?;
            }
            MemoryAction::Forget { category, id } => {
                store.remove_fact(&resolve(id)?, &category).await?;
                println!("✅ Forgot {category}");
            }
            MemoryAction::Clear { id } => {
                let id = resolve(id)?;
                store.clear(&id).await?;
                println!("✅ Cleared memory of {id}");
            }
            MemoryAction::Extract { .. } => {}
        }

        Ok(())
    }
}

fn record_id(global: bool, id: Option<String>) -> anyhow::Result<String> {
    match (global, id) {
        (true, _) => Ok(GLOBAL_RECORD_KEY.to_string()),
        (false, Some(id)) => Ok(id),
        (false, None) => anyhow::bail!("A conversation id is required unless --global is given"),
    }
}

fn print_record(record: &MemoryRecord) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(record)?);
    let context = format_context(record);
    if !context.is_empty() {
        println!("\n{context}");
    }
    Ok(())
}
