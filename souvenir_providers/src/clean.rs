//! Post-processing of raw model output.

const TURN_START: &str = "<|im_start|>assistant";
const TURN_END: &str = "<|im_end|>";
const SEPARATOR: &str = "==========";
const PROMPT_ECHO: &str = "Prompt:";
const ASSISTANT_CUE: &str = "Assistant:";

/// Lines the runtime prints around the completion.
const NOISE_PREFIXES: [&str; 4] = [PROMPT_ECHO, "Generation:", "Peak memory:", SEPARATOR];

/// Strip chat-template markers and runtime statistics, then keep what follows
/// the last `Assistant:` cue.
#[must_use]
pub fn clean_response(raw: &str) -> String {
    let body = raw.find(TURN_START).map_or_else(
        || {
            raw.lines()
                .filter(|line| !NOISE_PREFIXES.iter().any(|prefix| line.starts_with(prefix)))
                .collect::<Vec<_>>()
                .join("\n")
        },
        |start| {
            let rest = &raw[start + TURN_START.len()..];
            let end = [TURN_END, SEPARATOR, PROMPT_ECHO]
                .iter()
                .find_map(|marker| rest.find(marker))
                .unwrap_or(rest.len());
            rest[..end].to_string()
        },
    );

    body.rsplit(ASSISTANT_CUE)
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}
