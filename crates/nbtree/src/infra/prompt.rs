//! Interactive overwrite confirmation on the terminal.

use std::io::{self, BufRead, StdinLock, Stdout, Write};
use std::path::Path;

use crate::app::unpack::Confirm;
use crate::domain::errors::NbtreeError;

/// Asks a yes/no question per existing file; only `yes` (any case) accepts.
pub struct ConsoleConfirm<R, W> {
    input: R,
    output: W,
}

impl ConsoleConfirm<StdinLock<'static>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> ConsoleConfirm<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Confirm for ConsoleConfirm<R, W> {
    fn confirm_overwrite(&mut self, path: &Path) -> Result<bool, NbtreeError> {
        write!(
            self.output,
            "File '{}' already exists. Overwrite? (yes/no): ",
            path.display()
        )
        .and_then(|()| self.output.flush())
        .map_err(|err| NbtreeError::io("<stdout>", err))?;

        let mut answer = String::new();
        let read = self
            .input
            .read_line(&mut answer)
            .map_err(|err| NbtreeError::io("<stdin>", err))?;
        if read == 0 {
            tracing::debug!(path = %path.display(), "no answer on stdin, treating as no");
            return Ok(false);
        }

        Ok(answer
            .trim_end_matches(['\r', '\n'])
            .eq_ignore_ascii_case("yes"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn ask(input: &str) -> (bool, String) {
        let mut output = Vec::new();
        let answer = ConsoleConfirm::new(Cursor::new(input.as_bytes()), &mut output)
            .confirm_overwrite(Path::new("src/main.py"))
            .expect("prompt succeeds");
        (answer, String::from_utf8(output).unwrap())
    }

    #[test]
    fn accepts_yes_in_any_case() {
        for input in ["yes\n", "YES\n", "Yes\r\n", "yes"] {
            assert!(ask(input).0, "{input:?}");
        }
    }

    #[test]
    fn rejects_everything_else() {
        for input in ["y\n", "no\n", "\n", "yes please\n", " yes\n", ""] {
            assert!(!ask(input).0, "{input:?}");
        }
    }

    #[test]
    fn prints_question_with_path() {
        let (_, printed) = ask("no\n");
        assert_eq!(
            printed,
            "File 'src/main.py' already exists. Overwrite? (yes/no): "
        );
    }

    #[test]
    fn answers_are_read_one_line_at_a_time() {
        let mut output = Vec::new();
        let mut confirm = ConsoleConfirm::new(Cursor::new(&b"no\nyes\n"[..]), &mut output);

        assert!(!confirm.confirm_overwrite(Path::new("a")).unwrap());
        assert!(confirm.confirm_overwrite(Path::new("b")).unwrap());
    }
}
