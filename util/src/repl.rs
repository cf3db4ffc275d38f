use rustyline::{error::ReadlineError, Editor};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error<E> {
    #[error(transparent)]
    Readline(ReadlineError),
    #[error("Eval failed: {0:?}")]
    EvalError(E),
}

pub trait Repl {
    type Error: std::fmt::Debug;
    const HISTORY: Option<&'static str> = None;
    const PROMPT: &'static str = ">> ";
    const CONTINUATION_PROMPT: &'static str = ".. ";
    fn evaluate(&mut self, input: String) -> Result<(), Self::Error>;
}

/// Lines ending with `\` are continued on the next line. Returns the whole
/// input once a line without it arrives.
fn join_continued(pending: &mut Option<String>, mut line: String) -> Option<String> {
    if line.ends_with('\\') {
        line.pop();
        line.push('\n');
        match pending.as_mut() {
            Some(input) => input.push_str(&line),
            None => *pending = Some(line),
        }
        return None;
    }
    Some(match pending.take() {
        Some(mut input) => {
            input.push_str(&line);
            input
        }
        None => line,
    })
}

pub fn start_repl<R: Repl>(mut repl: R) -> Result<(), Error<R::Error>> {
    let mut editor = Editor::<()>::new();
    if let Some(history) = R::HISTORY {
        editor.load_history(history).ok();
    }
    let mut pending: Option<String> = None;
    loop {
        let prompt = if pending.is_some() {
            R::CONTINUATION_PROMPT
        } else {
            R::PROMPT
        };
        match editor.readline(prompt) {
            Ok(line) => {
                let input = match join_continued(&mut pending, line) {
                    Some(input) => input,
                    None => continue,
                };
                editor.add_history_entry(input.as_str());
                repl.evaluate(input).map_err(Error::EvalError)?;
                if let Some(history) = R::HISTORY {
                    editor.save_history(history).map_err(Error::Readline)?;
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => {
                println!("Bye!");
                break Ok(());
            }
            Err(e) => break Err(Error::Readline(e)),
        }
    }
}
