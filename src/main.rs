use ariadne::{Color, Label, Report, ReportKind, Source};
use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use pythox::lexer::{LexicalError, TokenStream};
use pythox::runtime::StdioContext;
use std::fs::read_to_string;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[clap(name = "pythox", version)]
pub struct CLArgs {
    #[clap(subcommand)]
    pub routine: PythoxCommand,
}

#[derive(Debug, Subcommand)]
pub enum PythoxCommand {
    /// Dump the token sequence of a source file, one token per line.
    Tokenize { path: PathBuf },
    /// Execute a source file.
    Run { path: PathBuf },
}

fn main() -> ExitCode {
    pythox_main().expect("Encountered an error!")
}

fn pythox_main() -> Result<ExitCode> {
    color_eyre::install().expect("Can't fail at first call!");
    let args = CLArgs::parse();
    match args.routine {
        PythoxCommand::Tokenize { path } => {
            let src = read_to_string(&path)?;
            match TokenStream::lex(&src) {
                Ok(stream) => {
                    for token in stream.tokens() {
                        println!("{token:?}");
                    }
                }
                Err(error) => {
                    report_lexical_error(&path, &src, &error);
                    return Ok(ExitCode::from(65));
                }
            }
        }
        PythoxCommand::Run { path } => {
            let src = read_to_string(&path)?;
            let mut context = StdioContext;
            match pythox::run_program(&src, &mut context) {
                Ok(()) => {}
                Err(pythox::Error::Lex(error)) => {
                    report_lexical_error(&path, &src, &error);
                    return Ok(ExitCode::from(65));
                }
                Err(pythox::Error::Parse(error)) => {
                    eprintln!("{error}");
                    return Ok(ExitCode::from(65));
                }
                Err(pythox::Error::Runtime(error)) => {
                    eprintln!("{error}");
                    return Ok(ExitCode::from(70));
                }
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn report_lexical_error(path: &Path, src: &str, error: &LexicalError) {
    let name = path.display().to_string();
    let end = src.len().min(error.offset + 1);
    let span = error.offset.min(end)..end;
    Report::build(ReportKind::Error, (name.as_str(), span.clone()))
        .with_message(error.kind.to_string())
        .with_label(
            Label::new((name.as_str(), span))
                .with_message(error.kind.to_string())
                .with_color(Color::BrightRed),
        )
        .finish()
        .eprint((name.as_str(), Source::from(src)))
        .expect("Failed to write report to stderr!");
}
