//! Prompt construction for the map and coherence passes

use readlab_domain::Chunk;

/// System instructions sent with every request
pub const SYSTEM_PROMPT: &str = "You are a careful research summarizer. Output STRICT JSON matching the \
requested schema. Use short, specific sentences and include key numbers and findings. \
Extract at most 2 quotes of at most 25 words, copied verbatim from the text. Keep 3-8 concise tags. \
Always include: title, tl_dr, contributions, methods, results, limitations.";

const MAP_INSTRUCTIONS: &str = "Summarize this chunk: local key claims, methods, results, limitations, \
and useful verbatim quotes. Only use information present in the chunk.";

const COHERENCE_INSTRUCTIONS: &str = "Merge these per-chunk notes into ONE coherent tl_dr paragraph for \
the whole document. Keep the strongest findings and limitations. Do not invent facts.";

const OUTPUT_FORMAT_REMINDER: &str = "Respond with a single JSON object and nothing else.";

const STRICT_REMINDER: &str = "Your previous answer did not match the schema. Return ONLY one JSON object \
with exactly the listed fields and the listed types. No prose, no markdown fences.";

/// Builds prompts for the generation service
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    strict: bool,
}

impl PromptBuilder {
    /// Create a prompt builder
    pub fn new() -> Self {
        Self { strict: false }
    }

    /// Ask for strict conformance (used on retries after schema failures)
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Prompt for one chunk of the map step
    pub fn map_prompt(&self, chunk: &Chunk, total: usize) -> String {
        let mut prompt = String::new();
        prompt.push_str(MAP_INSTRUCTIONS);
        prompt.push_str("\n\n");
        prompt.push_str(&format!("CHUNK {}/{}:\n", chunk.index + 1, total));
        prompt.push_str("---\n");
        prompt.push_str(&chunk.text);
        prompt.push_str("\n---\n\n");
        prompt.push_str("Fields: title (string, may be empty), authors (list), year (integer or null), ");
        prompt.push_str("venue (string or null), tl_dr (string), contributions, methods, results, ");
        prompt.push_str("limitations, tags, quotes, references (lists of strings).\n");
        self.push_reminder(&mut prompt);
        prompt
    }

    /// Prompt for the coherence pass over merged partials
    pub fn coherence_prompt(&self, seed: &str, contributions: &[String], results: &[String]) -> String {
        let mut prompt = String::new();
        prompt.push_str(COHERENCE_INSTRUCTIONS);
        prompt.push_str("\n\n");
        prompt.push_str("Draft tl_dr:\n");
        prompt.push_str(seed);
        prompt.push_str("\n\n");

        push_list(&mut prompt, "Contributions", contributions);
        push_list(&mut prompt, "Results", results);

        prompt.push_str("Fields: tl_dr (string).\n");
        self.push_reminder(&mut prompt);
        prompt
    }

    fn push_reminder(&self, prompt: &mut String) {
        prompt.push_str(OUTPUT_FORMAT_REMINDER);
        if self.strict {
            prompt.push('\n');
            prompt.push_str(STRICT_REMINDER);
        }
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn push_list(prompt: &mut String, heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    prompt.push_str(heading);
    prompt.push_str(":\n");
    for item in items.iter().take(12) {
        prompt.push_str("- ");
        prompt.push_str(item);
        prompt.push('\n');
    }
    prompt.push('\n');
}
