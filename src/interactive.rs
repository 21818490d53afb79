//! Terminal oracle: shows both items and reads the choice from a line reader.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::elicit::{Abort, Oracle};
use crate::relation::Relation;
use crate::scenario::Scenario;
use crate::space::Item;

/// Asks a person through any async line reader / writer pair.
///
/// `a` picks the first item, `b` the second and `e` declares them equally
/// good. `q`, end of input or an I/O failure abort the session.
pub struct PromptOracle<R, W> {
    criterion_names: Vec<String>,
    named: Vec<(Item<String>, String)>,
    reader: R,
    writer: W,
}

impl<R, W> PromptOracle<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(scenario: &Scenario, reader: R, writer: W) -> Self {
        let named = match (&scenario.alternatives, &scenario.alternative_names) {
            (Some(items), Some(names)) => items.iter().cloned().zip(names.iter().cloned()).collect(),
            _ => Vec::new(),
        };
        Self {
            criterion_names: scenario.criterion_names.clone(),
            named,
            reader,
            writer,
        }
    }

    pub fn into_inner(self) -> (R, W) {
        (self.reader, self.writer)
    }

    /// Question text for a pair, marking criteria where the two differ.
    pub fn render_question(&self, a: &[String], b: &[String]) -> String {
        let mut out = String::from("\nWhich do you prefer?\n");
        for (key, item) in [("a", a), ("b", b)] {
            out.push_str(&format!("\n({key})"));
            if let Some((_, name)) = self.named.iter().find(|(alt, _)| alt.as_slice() == item) {
                out.push_str(&format!(" <<< {name}"));
            }
            out.push('\n');
            for (i, (name, level)) in self.criterion_names.iter().zip(item).enumerate() {
                out.push_str(&format!("- {name}: {level}"));
                if a.get(i) != b.get(i) {
                    out.push_str("   <<< different");
                }
                out.push('\n');
            }
        }
        out.push_str("\n(e) The two options are equally preferable\n(q) Abort\n\n");
        out
    }

    async fn write(&mut self, text: &str) -> std::io::Result<()> {
        self.writer.write_all(text.as_bytes()).await?;
        self.writer.flush().await
    }

    async fn abort(&mut self) -> Abort {
        if let Err(err) = self.write("Aborted.\n").await {
            tracing::debug!(error = %err, "could not report abort");
        }
        Abort
    }
}

#[async_trait::async_trait]
impl<R, W> Oracle<String> for PromptOracle<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn ask(&mut self, a: &[String], b: &[String]) -> Result<Relation, Abort> {
        let question = self.render_question(a, b);
        if self.write(&question).await.is_err() {
            return Err(Abort);
        }
        loop {
            if self.write("> ").await.is_err() {
                return Err(Abort);
            }
            let mut line = String::new();
            match self.reader.read_line(&mut line).await {
                Ok(0) => return Err(self.abort().await),
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(error = %err, "failed to read answer");
                    return Err(self.abort().await);
                }
            }
            match line.trim().to_ascii_lowercase().as_str() {
                "a" => return Ok(Relation::Greater),
                "b" => return Ok(Relation::Less),
                "e" => return Ok(Relation::Equal),
                "q" => return Err(self.abort().await),
                _ => {
                    if self.write("Invalid input.\n").await.is_err() {
                        return Err(Abort);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario() -> Scenario {
        Scenario::from_json_str(
            r#"{"criteria": {"size": ["small", "large"], "view": ["street", "sea"]},
                "alts": {"Loft": {"size": "large", "view": "street"},
                         "Studio": {"size": "small", "view": "sea"}}}"#,
        )
        .unwrap()
    }

    fn item(levels: &[&str]) -> Item<String> {
        levels.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn answers_map_to_relations() {
        let s = scenario();
        let input: &[u8] = b"A\n b \ne\n";
        let mut oracle = PromptOracle::new(&s, input, Vec::new());
        let loft = item(&["large", "street"]);
        let studio = item(&["small", "sea"]);
        assert_eq!(oracle.ask(&loft, &studio).await, Ok(Relation::Greater));
        assert_eq!(oracle.ask(&loft, &studio).await, Ok(Relation::Less));
        assert_eq!(oracle.ask(&loft, &studio).await, Ok(Relation::Equal));
    }

    #[tokio::test]
    async fn invalid_input_prompts_again() {
        let s = scenario();
        let input: &[u8] = b"maybe\n\nb\n";
        let mut oracle = PromptOracle::new(&s, input, Vec::new());
        let answer = oracle
            .ask(&item(&["large", "street"]), &item(&["small", "sea"]))
            .await;
        assert_eq!(answer, Ok(Relation::Less));
        let (_, written) = oracle.into_inner();
        let text = String::from_utf8(written).unwrap();
        assert_eq!(text.matches("Invalid input.").count(), 2);
        assert_eq!(text.matches("> ").count(), 3);
    }

    #[tokio::test]
    async fn quit_and_end_of_input_abort() {
        let s = scenario();
        let pair = (item(&["large", "sea"]), item(&["small", "sea"]));

        let mut oracle = PromptOracle::new(&s, &b"q\n"[..], Vec::new());
        assert_eq!(oracle.ask(&pair.0, &pair.1).await, Err(Abort));
        let (_, written) = oracle.into_inner();
        assert!(String::from_utf8(written).unwrap().ends_with("Aborted.\n"));

        let mut oracle = PromptOracle::new(&s, &b""[..], Vec::new());
        assert_eq!(oracle.ask(&pair.0, &pair.1).await, Err(Abort));
    }

    #[test]
    fn question_marks_names_and_differences() {
        let s = scenario();
        let oracle = PromptOracle::new(&s, &b""[..], Vec::new());
        let text = oracle.render_question(&item(&["large", "street"]), &item(&["large", "sea"]));
        assert!(text.contains("(a) <<< Loft\n"));
        assert!(text.contains("\n(b)\n"));
        assert!(text.contains("- size: large\n"));
        assert!(text.contains("- view: street   <<< different\n"));
        assert!(text.contains("(q) Abort"));
    }
}
