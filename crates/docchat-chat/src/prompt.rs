//! Grounded prompt construction.

use std::fmt::Write;

use docchat_core::SearchResult;

const INSTRUCTIONS: &str = "\
You are an assistant that answers questions about the user's documents.
Answer ONLY from the numbered context fragments below.
Do not use outside knowledge, and do not guess beyond what the fragments say.
If the fragments do not contain enough information to answer, say that you do not have sufficient information in the documents to answer the question.";

/// Build the prompt: instructions, the fragments numbered in rank order,
/// then the question.
pub fn build_prompt(question: &str, contexts: &[SearchResult]) -> String {
    let mut prompt = String::with_capacity(
        INSTRUCTIONS.len() + question.len() + contexts.iter().map(|c| c.text.len() + 8).sum::<usize>(),
    );
    prompt.push_str(INSTRUCTIONS);
    prompt.push_str("\n\nContext:\n");
    for (i, ctx) in contexts.iter().enumerate() {
        // writing to a String cannot fail
        let _ = writeln!(prompt, "[{}] {}", i + 1, ctx.text.trim());
    }
    let _ = write!(prompt, "\nQuestion: {}\n\nAnswer:", question.trim());
    prompt
}
