//! Prompt constants shared by the pipeline and the CLI.

/// Default system instruction placed at the top of every prompt.
pub const DEFAULT_SYSTEM_PROMPT: &str = "Tu es un assistant IA français serviable, clair et concis. Réponds en français de manière naturelle et directe, sans instructions ni méta-commentaires. Fournis des réponses utiles et pertinentes.";

/// Question asked about an uploaded PDF when the user gave none.
pub const DEFAULT_PDF_QUESTION: &str = "Résume ce document et indique ses points importants.";

/// Prefix of the user-visible text returned when generation fails.
pub const GENERATION_ERROR_PREFIX: &str = "Erreur: Impossible de générer une réponse.";

/// Question sent with an image when the user typed nothing.
pub const DEFAULT_IMAGE_QUESTION: &str = "Décris cette image.";
