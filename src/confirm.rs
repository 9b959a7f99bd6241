//! Human-in-the-loop confirmation before multi-effect operations.

use std::future::Future;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Stdin, Stdout};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Proceed,
    Decline,
}

/// Asks the user before an irreversible operation. One prompt at a time.
pub trait ConfirmationGate {
    fn confirm(&mut self, title: &str, message: &str) -> impl Future<Output = Decision>;
}

/// Answers every prompt the same way (`--yes`, scripted runs)
#[derive(Debug, Clone, Copy)]
pub struct AutoConfirm(pub Decision);

impl AutoConfirm {
    pub fn proceed() -> Self {
        Self(Decision::Proceed)
    }

    pub fn decline() -> Self {
        Self(Decision::Decline)
    }
}

impl ConfirmationGate for AutoConfirm {
    async fn confirm(&mut self, _title: &str, _message: &str) -> Decision {
        self.0
    }
}

/// Prompts on a text stream and reads a yes/no answer.
///
/// Anything but an explicit yes declines, including end of input.
pub struct PromptGate<R, W> {
    reader: R,
    writer: W,
}

impl PromptGate<BufReader<Stdin>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl<R, W> PromptGate<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    #[cfg(test)]
    fn into_parts(self) -> (R, W) {
        (self.reader, self.writer)
    }

    async fn ask(&mut self, title: &str, message: &str) -> std::io::Result<Decision> {
        let prompt = format!("\n{}\n{}\n[y/N] ", title, message);
        self.writer.write_all(prompt.as_bytes()).await?;
        self.writer.flush().await?;

        let mut answer = String::new();
        self.reader.read_line(&mut answer).await?;
        Ok(parse_answer(&answer))
    }
}

impl<R, W> ConfirmationGate for PromptGate<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    async fn confirm(&mut self, title: &str, message: &str) -> Decision {
        match self.ask(title, message).await {
            Ok(decision) => decision,
            Err(e) => {
                warn!(component = "confirm", error = %e, "Prompt failed, declining");
                Decision::Decline
            }
        }
    }
}

fn parse_answer(answer: &str) -> Decision {
    match answer.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" | "o" | "oui" => Decision::Proceed,
        _ => Decision::Decline,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_answer() {
        assert_eq!(parse_answer("y\n"), Decision::Proceed);
        assert_eq!(parse_answer("  YES "), Decision::Proceed);
        assert_eq!(parse_answer("oui"), Decision::Proceed);
        assert_eq!(parse_answer("n"), Decision::Decline);
        assert_eq!(parse_answer(""), Decision::Decline);
        assert_eq!(parse_answer("maybe"), Decision::Decline);
    }

    #[tokio::test]
    async fn test_auto_confirm() {
        assert_eq!(AutoConfirm::proceed().confirm("t", "m").await, Decision::Proceed);
        assert_eq!(AutoConfirm::decline().confirm("t", "m").await, Decision::Decline);
    }

    #[tokio::test]
    async fn test_prompt_gate_reads_answers_in_order() {
        let input: &[u8] = b"y\nno\n";
        let mut gate = PromptGate::new(input, Vec::new());

        assert_eq!(gate.confirm("Create hardlinks", "first?").await, Decision::Proceed);
        assert_eq!(gate.confirm("Create hardlinks", "second?").await, Decision::Decline);
        // End of input declines
        assert_eq!(gate.confirm("Create hardlinks", "third?").await, Decision::Decline);

        let (_, output) = gate.into_parts();
        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("first?"));
        assert!(output.contains("[y/N]"));
    }
}
