//! Answering session and chat lifecycle.
//!
//! An [`AnsweringSession`] owns one immutable [`VectorIndex`] and the
//! conversation history built on top of it. Each [`AnsweringSession::ask`]
//! retrieves the most relevant chunks, sends them to the chat model together
//! with every earlier turn, and records the new turn only once an answer
//! exists. A failed question leaves the history exactly as it was.
//!
//! [`ChatState`] wraps the session for interactive use: documents are either
//! loaded (a session exists) or not, and loading or resetting replaces the
//! whole state in one assignment.

use std::sync::Arc;
use std::time::Duration;

use crate::chunk::Chunker;
use crate::config::Config;
use crate::embedding::{embed_query, EmbeddingProvider};
use crate::error::Error;
use crate::index::{ScoredChunk, VectorIndex};
use crate::ingest::ingest_with;
use crate::llm::{create_chat_model, ChatMessage, ChatModel, ChatRequest};
use crate::models::{display_name, ConversationTurn, FileFailure, SourceFile};
use crate::progress::ProgressReporter;
use crate::qa_log::{QaLog, QaRecord};
use crate::summary::{summarize, FileSummary};

const GROUNDING_INSTRUCTIONS: &str = "Use the following pieces of context to answer the user's question. \
If you don't know the answer, just say that you don't know, don't try to make up an answer.";

const CONDENSE_INSTRUCTIONS: &str = "Given the following conversation and a follow up question, \
rephrase the follow up question to be a standalone question. Reply with the question only.";

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub top_k: usize,
    pub temperature: f32,
    /// Bound on each embedding and generation call.
    pub timeout: Duration,
    pub condense_question: bool,
}

impl SessionOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            top_k: config.retrieval.top_k,
            temperature: config.llm.temperature,
            timeout: Duration::from_secs(config.llm.timeout_secs),
            condense_question: config.llm.condense_question,
        }
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// A generated answer and the chunks it was grounded on.
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<ScoredChunk>,
}

pub struct AnsweringSession {
    index: VectorIndex,
    embedder: Arc<dyn EmbeddingProvider>,
    chat: Arc<dyn ChatModel>,
    options: SessionOptions,
    history: Vec<ConversationTurn>,
}

impl AnsweringSession {
    pub fn new(
        index: VectorIndex,
        embedder: Arc<dyn EmbeddingProvider>,
        chat: Arc<dyn ChatModel>,
        options: SessionOptions,
    ) -> Self {
        Self {
            index,
            embedder,
            chat,
            options,
            history: Vec::new(),
        }
    }

    /// Build the chat model from `config.llm` and start an empty session.
    ///
    /// # Errors
    ///
    /// [`Error::MissingCredential`] when the provider's key is not set.
    pub fn from_config(
        index: VectorIndex,
        embedder: Arc<dyn EmbeddingProvider>,
        config: &Config,
    ) -> Result<Self, Error> {
        let chat = create_chat_model(&config.llm)?;
        Ok(Self::new(
            index,
            embedder,
            chat,
            SessionOptions::from_config(config),
        ))
    }

    pub fn history(&self) -> &[ConversationTurn] {
        &self.history
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    /// Answer `question` against the indexed documents.
    ///
    /// # Errors
    ///
    /// [`Error::GenerationFailure`] when retrieval or generation fails or
    /// times out. History is unchanged in that case.
    pub async fn ask(&mut self, question: &str) -> Result<Answer, Error> {
        let retrieval_query = if self.options.condense_question && !self.history.is_empty() {
            self.condense(question).await?
        } else {
            question.to_string()
        };

        let query = self
            .bounded("embedding", embed_query(self.embedder.as_ref(), &retrieval_query))
            .await?;
        let sources = self.index.search(&query, self.options.top_k);
        tracing::debug!(hits = sources.len(), "retrieved context");

        let request = self.compose_request(question, &sources);
        let text = self
            .bounded("generation", self.chat.complete(&request))
            .await?;

        self.history.push(ConversationTurn {
            question: question.to_string(),
            answer: text.clone(),
            grounding: sources.iter().map(|s| s.chunk.clone()).collect(),
        });
        Ok(Answer { text, sources })
    }

    /// System message with instructions and retrieved context, then every
    /// prior turn verbatim, then the current question.
    pub fn compose_request(&self, question: &str, context: &[ScoredChunk]) -> ChatRequest {
        let context_text = context
            .iter()
            .map(|s| s.chunk.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let mut messages = Vec::with_capacity(2 + self.history.len() * 2);
        messages.push(ChatMessage::system(format!(
            "{}\n----------------\n{}",
            GROUNDING_INSTRUCTIONS, context_text
        )));
        for turn in &self.history {
            messages.push(ChatMessage::user(turn.question.clone()));
            messages.push(ChatMessage::assistant(turn.answer.clone()));
        }
        messages.push(ChatMessage::user(question));

        ChatRequest {
            messages,
            temperature: self.options.temperature,
        }
    }

    /// Rewrite a follow-up into a standalone question for retrieval.
    async fn condense(&self, question: &str) -> Result<String, Error> {
        let transcript = self
            .history
            .iter()
            .map(|t| format!("Human: {}\nAssistant: {}", t.question, t.answer))
            .collect::<Vec<_>>()
            .join("\n");
        let request = ChatRequest {
            messages: vec![
                ChatMessage::system(CONDENSE_INSTRUCTIONS),
                ChatMessage::user(format!(
                    "Chat History:\n{}\nFollow Up Input: {}\nStandalone question:",
                    transcript, question
                )),
            ],
            temperature: 0.0,
        };
        let standalone = self
            .bounded("condense", self.chat.complete(&request))
            .await?;
        let standalone = standalone.trim();
        tracing::debug!(%standalone, "condensed follow-up question");
        if standalone.is_empty() {
            Ok(question.to_string())
        } else {
            Ok(standalone.to_string())
        }
    }

    async fn bounded<T>(
        &self,
        stage: &str,
        fut: impl std::future::Future<Output = anyhow::Result<T>>,
    ) -> Result<T, Error> {
        match tokio::time::timeout(self.options.timeout, fut).await {
            Ok(Ok(v)) => Ok(v),
            Ok(Err(e)) => {
                tracing::warn!(stage, error = %format!("{:#}", e), "question failed");
                Err(Error::GenerationFailure(format!("{:#}", e)))
            }
            Err(_) => {
                tracing::warn!(stage, "question timed out");
                Err(Error::GenerationFailure(format!(
                    "{} timed out after {:?}",
                    stage, self.options.timeout
                )))
            }
        }
    }
}

/// What a successful load produced, for display.
#[derive(Debug, Clone)]
pub struct LoadReport {
    pub summaries: Vec<FileSummary>,
    pub failed: Vec<FileFailure>,
    pub chunks: usize,
}

/// Interactive lifecycle: either nothing is loaded or a session is ready.
#[derive(Default)]
pub enum ChatState {
    #[default]
    Uninitialized,
    Ready {
        session: AnsweringSession,
        processed_files: Vec<String>,
    },
}

impl ChatState {
    pub fn is_ready(&self) -> bool {
        matches!(self, ChatState::Ready { .. })
    }

    pub fn processed_files(&self) -> &[String] {
        match self {
            ChatState::Ready {
                processed_files, ..
            } => processed_files,
            ChatState::Uninitialized => &[],
        }
    }

    pub fn session(&self) -> Option<&AnsweringSession> {
        match self {
            ChatState::Ready { session, .. } => Some(session),
            ChatState::Uninitialized => None,
        }
    }

    /// Install a ready session, discarding whatever was there.
    pub fn load(&mut self, session: AnsweringSession, processed_files: Vec<String>) {
        *self = ChatState::Ready {
            session,
            processed_files,
        };
    }

    pub fn reset(&mut self) {
        *self = ChatState::Uninitialized;
    }

    /// Ingest, chunk and index `files`, then start a fresh session.
    ///
    /// On failure the state is left uninitialized, so stale documents are
    /// never answered from.
    pub async fn process(
        &mut self,
        files: &[SourceFile],
        unreadable: Vec<FileFailure>,
        config: &Config,
        embedder: Arc<dyn EmbeddingProvider>,
        chat: Arc<dyn ChatModel>,
        progress: &dyn ProgressReporter,
    ) -> Result<LoadReport, Error> {
        self.reset();

        let result = ingest_with(files, unreadable, progress)?;
        let chunker = Chunker::new(&config.chunking)?;
        let chunks = chunker.chunk_records(&result.records);
        let summaries = summarize(&result, &chunks);
        let chunk_count = chunks.len();

        let index = VectorIndex::build(
            chunks,
            embedder.as_ref(),
            config.embedding.batch_size,
            Duration::from_secs(config.embedding.timeout_secs),
            progress,
        )
        .await?;
        tracing::info!(chunks = chunk_count, dims = index.dims(), "documents indexed");

        let session = AnsweringSession::new(
            index,
            embedder,
            chat,
            SessionOptions::from_config(config),
        );
        self.load(session, result.processed);

        Ok(LoadReport {
            summaries,
            failed: result.failed,
            chunks: chunk_count,
        })
    }

    /// Ask the loaded session. After a successful answer the exchange is
    /// appended to `log` in the background.
    ///
    /// # Errors
    ///
    /// [`Error::NotReady`] when no documents are loaded; otherwise whatever
    /// [`AnsweringSession::ask`] returns.
    pub async fn ask(&mut self, question: &str, log: Option<&Arc<QaLog>>) -> Result<Answer, Error> {
        let ChatState::Ready {
            session,
            processed_files,
        } = self
        else {
            return Err(Error::NotReady);
        };

        let answer = session.ask(question).await?;

        if let Some(log) = log {
            let files = processed_files
                .iter()
                .map(|f| display_name(f).to_string())
                .collect();
            let _ = log.record_detached(QaRecord::now(files, question, &answer.text));
        }
        Ok(answer)
    }
}
