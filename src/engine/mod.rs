pub mod prompt;
pub mod rewrite;
pub mod trace;

use std::path::Path;

use tracing::{debug, info, warn};

use crate::errors::ExtractError;
use crate::llm::LlmClient;
use crate::notebook::Notebook;
use crate::report::{FailReason, Outcome, SkipReason};

/// Runs one all-or-nothing transaction per notebook: load, extract the
/// action trace, build the prompt, call the generation service, splice
/// the result in, save. A failure at any stage aborts the transaction
/// and leaves the on-disk file untouched.
pub struct RewriteEngine {
    llm: LlmClient,
    truncate_at: usize,
    dry_run: bool,
}

impl RewriteEngine {
    pub fn new(llm: LlmClient, truncate_at: usize, dry_run: bool) -> Self {
        Self {
            llm,
            truncate_at,
            dry_run,
        }
    }

    pub async fn process(&self, path: &Path) -> Outcome {
        let nb = match Notebook::load(path) {
            Ok(nb) => nb,
            Err(e) => {
                warn!(doc = %path.display(), error = %e, "load failed");
                return Outcome::Failed(FailReason::Document(e));
            }
        };

        let trace = match trace::extract(&nb) {
            Ok(t) => t,
            Err(ExtractError::EmptyTrace) => {
                debug!(doc = %path.display(), "no tool actions; leaving untouched");
                return Outcome::Skipped(SkipReason::EmptyTrace);
            }
            Err(ExtractError::NoReasoningCell) => {
                debug!(doc = %path.display(), "no reasoning cell; leaving untouched");
                return Outcome::Skipped(SkipReason::NoReasoningCell);
            }
            Err(e @ ExtractError::NoInstruction) => {
                warn!(doc = %path.display(), error = %e, "extraction failed");
                return Outcome::Failed(FailReason::Extraction(e));
            }
        };
        info!(
            doc = %path.display(),
            steps = trace.steps.len(),
            target = trace.target,
            "trace extracted"
        );

        let user_prompt = prompt::build_prompt(&trace, self.truncate_at);
        debug!(prompt_len = user_prompt.len(), "prompt built");
        if self.dry_run {
            return Outcome::Skipped(SkipReason::DryRun);
        }

        let text = match self.llm.generate(prompt::SYSTEM_PROMPT, &user_prompt).await {
            Ok(t) => t,
            Err(e) => {
                warn!(doc = %path.display(), error = %e, "generation failed");
                return Outcome::Failed(FailReason::Generation(e));
            }
        };

        let rewritten = match rewrite::rewrite(&nb, &[trace.target], &text) {
            Ok(n) => n,
            Err(e) => {
                warn!(doc = %path.display(), error = %e, "rewrite declined");
                return Outcome::Failed(FailReason::Rewrite(e));
            }
        };

        if let Err(e) = rewritten.save(path) {
            warn!(doc = %path.display(), error = %e, "save failed");
            return Outcome::Failed(FailReason::Document(e));
        }

        info!(doc = %path.display(), "notebook rewritten");
        Outcome::Saved
    }
}
