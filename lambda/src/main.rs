use std::{io::Write, path::PathBuf};

use anyhow::{anyhow, bail, Result};
use ariadne::{Color, Fmt, Label, Report, ReportKind, Source};
use clap::Parser;
use lambda::{
    definitions::Definitions,
    eval,
    parser::{self, ParseError, Span},
};
use tracing_subscriber::EnvFilter;
use util::repl;

/// Normal-order evaluator for the untyped lambda calculus.
///
/// With no arguments an interactive session is started.
#[derive(clap::Parser, Debug)]
#[command(version)]
struct Args {
    /// The expression to evaluate, or a definitions file when EXPRESSION follows
    first: Option<String>,
    /// The expression to evaluate against the definitions in FIRST
    #[arg(value_name = "EXPRESSION")]
    second: Option<String>,
    /// Definitions file for a single expression or the interactive session
    #[arg(short, long, value_name = "FILE")]
    definitions: Option<PathBuf>,
    /// Print every intermediate term
    #[arg(long)]
    trace: bool,
    /// Give up after this many reduction steps
    #[arg(long, value_name = "N")]
    max_steps: Option<usize>,
}

/// Byte span to the char span ariadne labels, widened to at least one char.
fn char_span(text: &str, span: &Span) -> Span {
    let start = text[..span.start].chars().count();
    let len = text[span.clone()].chars().count();
    start..start + len.max(1)
}

fn build_report(e: &ParseError) -> Report {
    let span = char_span(&e.text, &e.span);
    Report::build(ReportKind::Error, (), span.start)
        .with_message(format!(
            "{} in {}",
            e.kind,
            e.origin.to_string().fg(Color::Yellow)
        ))
        .with_label(
            Label::new(span)
                .with_message(format!("{}", e.kind.to_string().fg(Color::Red)))
                .with_color(Color::Red),
        )
        .finish()
}

fn report(e: &anyhow::Error) {
    match e.downcast_ref::<ParseError>() {
        Some(parse_error) => {
            if build_report(parse_error)
                .eprint(Source::from(&parse_error.text))
                .is_err()
            {
                eprintln!("Error: {parse_error}");
            }
        }
        None => eprintln!("Error: {e:#}"),
    }
}

struct Evaluator {
    definitions: Definitions,
    trace: bool,
    max_steps: Option<usize>,
}

impl Evaluator {
    /// Prints `input` as parsed and then its normal form.
    fn run(&self, input: &str, out: &mut impl Write) -> Result<()> {
        let term = parser::parse(input, &self.definitions)?;
        writeln!(out, "{term}")?;
        let mut written = Ok(());
        let normalized = eval::normalize_with(term, self.max_steps, |n, term| {
            if self.trace && written.is_ok() {
                written = writeln!(out, "{n:>4}: {term}");
            }
        })?;
        written?;
        writeln!(out, "{}", normalized.term)?;
        Ok(())
    }

    fn show_help() {
        println!(
            "{}",
            r#"
term                -- same as :eval term
:eval       term    -- show the parsed term and its normal form
:parse      term    -- show the parsed term
:step       term    -- show the term after a single reduction step
:def        name:term
                    -- define name for the rest of the session
:defs               -- list definitions
:help               -- show this message
        "#
            .trim()
        );
    }

    fn handle_repl_input(&mut self, input: &str, out: &mut impl Write) -> Result<()> {
        let (cmd, input) = if let Some(stripped) = input.strip_prefix(':') {
            stripped
                .trim_start()
                .split_once(' ')
                .unwrap_or((stripped, ""))
        } else {
            ("", input)
        };
        match cmd {
            "" | "e" | "eval" => {
                self.run(input, out)?;
            }
            "p" | "parse" => {
                let term = parser::parse(input, &self.definitions)?;
                writeln!(out, "{term}")?;
            }
            "s" | "step" => {
                let term = parser::parse(input, &self.definitions)?;
                let (term, changed) = eval::step(term);
                if changed {
                    writeln!(out, "{term}")?;
                } else {
                    writeln!(out, "{term} (normal form)")?;
                }
            }
            "d" | "def" => {
                let (name, text) = input
                    .split_once(':')
                    .ok_or_else(|| anyhow!("Expected `:def name:term`"))?;
                self.definitions.add(name.trim(), text.trim());
            }
            "defs" => {
                for (name, text) in self.definitions.sorted() {
                    writeln!(out, "{name}:{text}")?;
                }
            }
            "h" | "help" => {
                Self::show_help();
            }
            _ => {
                eprintln!("Unknown command {cmd}");
                Self::show_help();
            }
        }
        Ok(())
    }
}

impl repl::Repl for Evaluator {
    type Error = anyhow::Error;
    const HISTORY: Option<&'static str> = Some("/tmp/lambda.history");
    const PROMPT: &'static str = "λ> ";
    fn evaluate(&mut self, input: String) -> Result<(), Self::Error> {
        // continued lines arrive with their newlines
        let input = input.replace(|c: char| c.is_whitespace(), " ");
        let input = input.trim();
        if input.is_empty() {
            return Ok(());
        }
        if let Err(e) = self.handle_repl_input(input, &mut std::io::stdout().lock()) {
            report(&e);
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let (path, expression) = match (args.first, args.second) {
        (Some(path), Some(expression)) if args.definitions.is_none() => {
            (Some(PathBuf::from(path)), Some(expression))
        }
        (Some(_), Some(_)) => {
            bail!("--definitions cannot be combined with a definitions file argument")
        }
        (expression, _) => (args.definitions, expression),
    };
    let definitions = path.map(Definitions::load).transpose()?.unwrap_or_default();
    let evaluator = Evaluator {
        definitions,
        trace: args.trace,
        max_steps: args.max_steps,
    };

    match expression {
        Some(expression) => {
            if let Err(e) = evaluator.run(&expression, &mut std::io::stdout().lock()) {
                report(&e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Untyped lambda calculus, normal order. :h to show help");
            println!();
            repl::start_repl(evaluator)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    fn evaluator(definitions: &str) -> Evaluator {
        Evaluator {
            definitions: Definitions::parse(definitions).unwrap(),
            trace: false,
            max_steps: Some(10_000),
        }
    }

    fn run(evaluator: &Evaluator, input: &str) -> Result<String> {
        let mut out = vec![];
        evaluator.run(input, &mut out)?;
        Ok(String::from_utf8(out)?)
    }

    fn repl(evaluator: &mut Evaluator, input: &str) -> Result<String> {
        let mut out = vec![];
        evaluator.handle_repl_input(input, &mut out)?;
        Ok(String::from_utf8(out)?)
    }

    #[test]
    fn test_run_prints_parsed_and_normal_form() {
        let e = evaluator("");
        assert_eq!(run(&e, "λx.x").unwrap(), "λx.x\nλx.x\n");
        assert_eq!(run(&e, "(λx.x) y").unwrap(), "(λx.x) y\ny\n");
    }

    #[test]
    fn test_run_with_definitions() {
        let e = evaluator("true:λt.λf.t\nfalse:λt.λf.f\nnot:λb.b false true\n");
        assert_eq!(
            run(&e, "not true").unwrap(),
            "(λb.b (λt.λf.f) (λt.λf.t)) (λt.λf.t)\nλt.λf.f\n"
        );
    }

    #[test]
    fn test_run_trace() {
        let mut e = evaluator("");
        e.trace = true;
        assert_eq!(
            run(&e, "(λx.x) ((λy.y) z)").unwrap(),
            "(λx.x) ((λy.y) z)\n   1: (λy.y) z\n   2: z\nz\n"
        );
    }

    #[test]
    fn test_run_errors() {
        let e = evaluator("");
        let err = run(&e, "λx x").unwrap_err();
        assert!(err.downcast_ref::<ParseError>().is_some());
        let err = run(&e, "(λx.x x) (λx.x x)").unwrap_err();
        assert_eq!(
            err.downcast_ref::<eval::EvalError>(),
            Some(&eval::EvalError::StepLimit { limit: 10_000 })
        );
    }

    #[test]
    fn test_repl_commands() {
        let mut e = evaluator("");
        assert_eq!(repl(&mut e, ":def id:λx.x").unwrap(), "");
        assert_eq!(repl(&mut e, ":defs").unwrap(), "id:λx.x\n");
        assert_eq!(repl(&mut e, ":parse id y").unwrap(), "(λx.x) y\n");
        assert_eq!(repl(&mut e, ":step id (id y)").unwrap(), "(λx.x) y\n");
        assert_eq!(repl(&mut e, ":step y").unwrap(), "y (normal form)\n");
        assert_eq!(repl(&mut e, "id (id y)").unwrap(), "(λx.x) ((λx.x) y)\ny\n");
        assert!(repl(&mut e, ":def nonsense").is_err());
    }

    #[test]
    fn test_char_span() {
        assert_eq!(char_span("λx x", &(0..5)), 0..4);
        assert_eq!(char_span("λx.", &(4..4)), 3..4);
    }
}
