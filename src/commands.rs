//! Command implementations behind the `docqa` binary.
//!
//! Each `run_*` function owns one subcommand: it reads the uploads, drives
//! the library pipeline and prints user-facing output on stdout. Progress and
//! diagnostics go to stderr.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::chunk::Chunker;
use crate::config::Config;
use crate::embedding::{create_provider, EmbeddingProvider};
use crate::error::Error;
use crate::files::read_sources;
use crate::index::ScoredChunk;
use crate::ingest::ingest_with;
use crate::llm::{create_chat_model, ChatModel};
use crate::models::{display_name, FileFailure};
use crate::progress::ProgressMode;
use crate::qa_log::QaLog;
use crate::session::{ChatState, LoadReport};
use crate::summary::summarize;

/// `docqa ingest`: parse and chunk, then print per-file summaries.
pub async fn run_ingest(config: &Config, paths: &[PathBuf], progress: ProgressMode) -> Result<()> {
    let (files, unreadable) = read_sources(paths);
    let reporter = progress.reporter();

    let result = match ingest_with(&files, unreadable, reporter.as_ref()) {
        Ok(result) => result,
        Err(Error::NoValidDocuments { failed }) => {
            print_failures(&failed);
            return Err(Error::NoValidDocuments { failed }.into());
        }
        Err(e) => return Err(e.into()),
    };

    let chunker = Chunker::new(&config.chunking)?;
    let chunks = chunker.chunk_records(&result.records);

    println!("File Summaries");
    for summary in summarize(&result, &chunks) {
        println!("{}\n", summary);
    }
    print_failures(&result.failed);
    println!(
        "Processed {} file(s) into {} chunk(s).",
        result.processed.len(),
        chunks.len()
    );
    Ok(())
}

/// `docqa ask`: load documents and answer one question.
pub async fn run_ask(
    config: &Config,
    question: &str,
    paths: &[PathBuf],
    progress: ProgressMode,
) -> Result<()> {
    let chat = create_chat_model(&config.llm)?;
    let embedder = create_provider(&config.embedding)?;
    let log = qa_log(config);

    let mut state = ChatState::default();
    let report = load(&mut state, paths, config, &embedder, &chat, progress).await?;
    print_failures(&report.failed);

    let answer = state.ask(question, log.as_ref()).await?;
    println!("{}", answer.text);
    print_sources(&answer.sources);
    Ok(())
}

/// `docqa chat`: interactive session on stdin.
pub async fn run_chat(config: &Config, paths: &[PathBuf], progress: ProgressMode) -> Result<()> {
    let chat = create_chat_model(&config.llm)?;
    let embedder = create_provider(&config.embedding)?;
    let log = qa_log(config);
    let mut state = ChatState::default();

    if !paths.is_empty() {
        load_and_report(&mut state, paths, config, &embedder, &chat, progress).await;
    }

    println!("Ask a question about your documents. Commands: /load <paths>, /reset, /history, /quit");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();

        match line {
            "" => continue,
            "/quit" | "/exit" => break,
            "/reset" => {
                state.reset();
                println!("Chat reset.");
            }
            "/history" => match state.session() {
                Some(session) if !session.history().is_empty() => {
                    for turn in session.history() {
                        println!("You: {}\nAssistant: {}\n", turn.question, turn.answer);
                    }
                }
                _ => println!("(no history)"),
            },
            cmd if cmd == "/load" || cmd.starts_with("/load ") => {
                let paths = load_args(&cmd["/load".len()..]);
                if paths.is_empty() {
                    println!("Usage: /load <paths>...  (quote paths that contain spaces)");
                    continue;
                }
                load_and_report(&mut state, &paths, config, &embedder, &chat, progress).await;
            }
            question => match state.ask(question, log.as_ref()).await {
                Ok(answer) => println!("{}\n", answer.text),
                Err(e) => println!("{}\n", e),
            },
        }
    }

    Ok(())
}

async fn load(
    state: &mut ChatState,
    paths: &[PathBuf],
    config: &Config,
    embedder: &Arc<dyn EmbeddingProvider>,
    chat: &Arc<dyn ChatModel>,
    progress: ProgressMode,
) -> Result<LoadReport, Error> {
    let (files, unreadable) = read_sources(paths);
    let reporter = progress.reporter();
    state
        .process(
            &files,
            unreadable,
            config,
            Arc::clone(embedder),
            Arc::clone(chat),
            reporter.as_ref(),
        )
        .await
}

/// Load for the REPL: failures are printed, never fatal.
async fn load_and_report(
    state: &mut ChatState,
    paths: &[PathBuf],
    config: &Config,
    embedder: &Arc<dyn EmbeddingProvider>,
    chat: &Arc<dyn ChatModel>,
    progress: ProgressMode,
) {
    match load(state, paths, config, embedder, chat, progress).await {
        Ok(report) => {
            println!("Documents processed successfully!\n");
            for summary in &report.summaries {
                println!("{}\n", summary);
            }
            print_failures(&report.failed);
        }
        Err(Error::NoValidDocuments { failed }) => {
            print_failures(&failed);
            println!("Error processing documents: {}", Error::NoValidDocuments { failed });
        }
        Err(e) => println!("Error processing documents: {}", e),
    }
}

/// Split `/load` arguments on whitespace. Single or double quotes group a
/// path containing spaces.
fn load_args(rest: &str) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for c in rest.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c.is_whitespace() => {
                if !current.is_empty() {
                    paths.push(PathBuf::from(std::mem::take(&mut current)));
                }
            }
            None => current.push(c),
        }
    }
    if !current.is_empty() {
        paths.push(PathBuf::from(current));
    }
    paths
}

fn qa_log(config: &Config) -> Option<Arc<QaLog>> {
    config
        .log
        .enabled
        .then(|| Arc::new(QaLog::new(&config.log.responses_path)))
}

fn print_failures(failed: &[FileFailure]) {
    if failed.is_empty() {
        return;
    }
    println!("Some files failed to process:");
    for failure in failed {
        println!("  {}", failure);
    }
}

fn print_sources(sources: &[ScoredChunk]) {
    if sources.is_empty() {
        return;
    }
    println!("\nSources:");
    for (i, hit) in sources.iter().enumerate() {
        println!(
            "  [{}] {} ({}) score {:.3}",
            i + 1,
            display_name(&hit.chunk.source),
            hit.chunk.locator,
            hit.score
        );
    }
}
