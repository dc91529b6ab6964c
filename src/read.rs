use crate::data::{Error, Outcome};
use std::io::{BufRead, Write};

/// Line-oriented question/answer loop over any reader and writer. Used by
/// the interactive session; tests drive it with byte slices.
pub(crate) struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn out(&mut self) -> &mut W {
        &mut self.output
    }

    /// Shows `question` and reads one line, without its line ending.
    /// `None` once the input is exhausted.
    pub fn ask(&mut self, question: &str) -> Result<Option<String>, anyhow::Error> {
        write!(self.output, "{question}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    /// Asks until `check` accepts the answer or signals an abort. Rejected
    /// answers print the error and `hint`, then the question comes again.
    /// Running out of input counts as an abort.
    pub fn ask_until<T>(
        &mut self,
        question: &str,
        hint: &str,
        mut check: impl FnMut(&str) -> Result<Outcome<T>, Error>,
    ) -> Result<Outcome<T>, anyhow::Error> {
        loop {
            let Some(answer) = self.ask(question)? else {
                return Ok(Outcome::Aborted);
            };
            match check(&answer) {
                Ok(outcome) => return Ok(outcome),
                Err(e) if hint.is_empty() => writeln!(self.output, "Error: {e}")?,
                Err(e) => writeln!(self.output, "Error: {e} {hint}")?,
            }
        }
    }
}
