use crate::errors::RewriteError;
use crate::notebook::Notebook;

/// Splice generated text into the target reasoning cell(s). Returns a new
/// notebook; every untargeted cell is identical to the input. Declines
/// rather than writing degenerate content.
pub fn rewrite(
    nb: &Notebook,
    targets: &[usize],
    text: &str,
) -> Result<Notebook, RewriteError> {
    let text = text.trim();
    sanity_check(text)?;

    let mut out = nb.clone();
    for &index in targets {
        out = out.replace_reasoning(index, text)?;
    }
    Ok(out)
}

fn sanity_check(text: &str) -> Result<(), RewriteError> {
    if text.is_empty() {
        return Err(RewriteError::Declined("empty text"));
    }
    if text
        .chars()
        .any(|c| c.is_control() && c != '\n' && c != '\t' && c != '\r')
    {
        return Err(RewriteError::Declined("non-printable characters"));
    }
    Ok(())
}
