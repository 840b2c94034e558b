//! Prompt templates
//!
//! Named templates with `{context}`, `{history}`, and `{question}` slots.
//! Unknown template names fall back to the default conversational template.

use crate::types::{Message, MessageRole};

const CHAT_WITH_DOCS: &str = "\
You are a helpful assistant answering questions about the user's documents.

Use the following document excerpts to answer the question. If the excerpts \
do not contain enough information, say that you don't have enough information \
in the provided documents; do not invent an answer.

Document excerpts:
{context}

{history}Question: {question}

Answer:";

const SUMMARIZE_DOCUMENT: &str = "\
You are a helpful assistant that writes concise summaries.

Summarize the key content of the following document excerpts in a few short \
paragraphs. Focus on the main topics and conclusions.

Document excerpts:
{context}

{history}Request: {question}

Summary:";

const EXTRACT_KEY_POINTS: &str = "\
You are a helpful assistant that extracts key points.

From the following document excerpts, list the most important points as a \
concise bulleted list.

Document excerpts:
{context}

{history}Request: {question}

Key points:";

const TECHNICAL_EXPLANATION: &str = "\
You are a technical expert explaining concepts precisely.

Using the following document excerpts, give a technically accurate and \
detailed answer. Define any jargon you use. If the excerpts do not cover the \
topic, say so explicitly.

Document excerpts:
{context}

{history}Question: {question}

Answer:";

const NO_CONTEXT_NOTE: &str =
    "(No relevant document excerpts were found for this question.)";

/// A retrieved excerpt with its source title
#[derive(Debug, Clone)]
pub struct ContextBlock {
    pub title: String,
    pub text: String,
}

/// Renders retrieval results and chat history into a model prompt
pub struct PromptBuilder {
    template: &'static str,
    history_limit: usize,
}

impl PromptBuilder {
    /// Look up a template by name, defaulting to `chat_with_docs`
    pub fn for_template(name: &str) -> Self {
        let template = match name {
            "chat_with_docs" => CHAT_WITH_DOCS,
            "summarize_document" => SUMMARIZE_DOCUMENT,
            "extract_key_points" => EXTRACT_KEY_POINTS,
            "technical_explanation" => TECHNICAL_EXPLANATION,
            other => {
                tracing::warn!("Unknown prompt template '{}', using chat_with_docs", other);
                CHAT_WITH_DOCS
            }
        };
        Self {
            template,
            history_limit: 6,
        }
    }

    /// Render the final prompt
    pub fn render(&self, question: &str, context: &[ContextBlock], history: &[Message]) -> String {
        self.template
            .replace("{context}", &self.render_context(context))
            .replace("{history}", &self.render_history(history))
            .replace("{question}", question)
    }

    fn render_context(&self, context: &[ContextBlock]) -> String {
        if context.is_empty() {
            return NO_CONTEXT_NOTE.to_string();
        }
        context
            .iter()
            .enumerate()
            .map(|(i, block)| format!("[{}] From \"{}\":\n{}", i + 1, block.title, block.text))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Render the most recent turns, oldest first
    fn render_history(&self, history: &[Message]) -> String {
        if history.is_empty() {
            return String::new();
        }
        let start = history.len().saturating_sub(self.history_limit);
        let mut out = String::from("Conversation so far:\n");
        for message in &history[start..] {
            let speaker = match message.role {
                MessageRole::User => "User",
                MessageRole::Assistant => "Assistant",
                MessageRole::System => "System",
            };
            out.push_str(&format!("{}: {}\n", speaker, message.content));
        }
        out.push('\n');
        out
    }
}
