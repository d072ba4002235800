//! # Lectern: study assistant CLI
//!
//! Usage:
//!   lectern ingest notes.pdf --title "Cell Biology"
//!   lectern ask <doc-id> "What does the mitochondria produce?"
//!   lectern flashcards <doc-id> --count 20
//!   lectern quiz <doc-id> && lectern submit <quiz-id> 2 4 1 3 1

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use lectern_core::LecternConfig;
use lectern_core::types::{ChatRole, Document};
use lectern_knowledge::{Ingestor, Retriever};
use lectern_study::{AnswerInput, GroundedAnswer, StudyAssistant};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "lectern",
    version,
    about = "📚 Lectern: ask questions, make flashcards and quizzes from your documents"
)]
struct Cli {
    /// Config file (default: ~/.lectern/config.toml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Upload a PDF, text or markdown file and process it
    Ingest {
        file: PathBuf,
        #[arg(short, long)]
        title: Option<String>,
        /// Seconds to wait for processing
        #[arg(long, default_value = "300")]
        timeout: u64,
    },
    /// List documents, newest first
    List,
    /// Show one document as JSON (without its text and chunks)
    Show { id: String },
    /// Print a document's chunks
    Chunks { id: String },
    /// Rank a document's chunks against a query without calling the LLM
    Search {
        id: String,
        query: String,
        #[arg(short, default_value = "3")]
        k: usize,
    },
    /// Ask a question grounded in a document
    Ask { id: String, question: String },
    /// Explain a concept using a document
    Explain { id: String, concept: String },
    /// Generate a flashcard set
    Flashcards {
        id: String,
        #[arg(long)]
        count: Option<usize>,
    },
    /// List flashcard sets for a document
    Sets { id: String },
    /// Mark a flashcard as reviewed
    Review { set_id: String, card_id: String },
    /// Star or unstar a flashcard
    Star { set_id: String, card_id: String },
    /// Generate a multiple-choice quiz
    Quiz {
        id: String,
        #[arg(short = 'n', long)]
        questions: Option<usize>,
        #[arg(short, long)]
        title: Option<String>,
    },
    /// Submit answers in question order: option number (1-4), option text, or "-" to skip
    Submit {
        quiz_id: String,
        #[arg(required = true)]
        answers: Vec<String>,
    },
    /// Show a submitted quiz with answers
    Results { quiz_id: String },
    /// Summarize a document
    Summary { id: String },
    /// Show a document's chat history
    History { id: String },
    /// Delete a document and everything generated from it
    Delete { id: String },
}

struct App {
    ingestor: Ingestor,
    assistant: StudyAssistant,
}

impl App {
    fn build(config: LecternConfig) -> Result<Self> {
        let stores = lectern_memory::create_store(&config.storage)?;
        let provider = lectern_providers::create_provider(&config.provider)?;
        let retriever = Retriever::from_config(&config.retrieval)?;
        tracing::debug!(
            "store={} provider={} scorer={} top_k={}",
            stores.backend_name(),
            provider.name(),
            retriever.scorer_name(),
            retriever.top_k()
        );

        let ingestor = Ingestor::new(stores.documents.clone(), config.chunking, &config.ingest)?;
        let assistant = StudyAssistant::new(
            stores.documents,
            stores.study,
            Arc::from(provider),
            retriever,
            config.generation.clone(),
        );
        Ok(Self {
            ingestor,
            assistant,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "lectern=debug,lectern_knowledge=debug,lectern_study=debug,lectern_providers=debug,lectern_memory=debug"
    } else {
        "lectern=info,lectern_knowledge=info,lectern_study=info,lectern_providers=warn,lectern_memory=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => {
            let path = PathBuf::from(shellexpand::tilde(path).to_string());
            LecternConfig::load_from(&path)
                .with_context(|| format!("loading {}", path.display()))?
        }
        None => LecternConfig::load()?,
    };
    let app = App::build(config)?;

    run(&app, cli.command).await
}

async fn run(app: &App, command: Command) -> Result<()> {
    let assistant = &app.assistant;
    match command {
        Command::Ingest {
            file,
            title,
            timeout,
        } => {
            let doc = app.ingestor.submit(&file, title.as_deref()).await?;
            println!("📄 Accepted {} ({}), processing...", doc.title, doc.id);
            let doc = app
                .ingestor
                .wait_until_settled(&doc.id, Duration::from_millis(200), Duration::from_secs(timeout))
                .await?;
            print_document(&doc);
            if let Some(err) = &doc.error {
                bail!("processing failed: {err}");
            }
        }
        Command::List => {
            let docs = assistant.list_documents().await?;
            if docs.is_empty() {
                println!("No documents yet. Try: lectern ingest <file>");
            }
            for doc in docs {
                println!(
                    "{}  {:<10}  {:>4} chunks  {}",
                    doc.id,
                    doc.status.to_string(),
                    doc.chunks.len(),
                    doc.title
                );
            }
        }
        Command::Show { id } => {
            let mut doc = assistant.document(&id).await?;
            doc.extracted_text = format!("<{} chars>", doc.extracted_text.chars().count());
            doc.chunks.clear();
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
        Command::Chunks { id } => {
            let doc = assistant.document(&id).await?;
            doc.ensure_ready()?;
            for chunk in &doc.chunks {
                print_chunk_header(chunk.chunk_index, chunk.page_number);
                println!("{}\n", chunk.content);
            }
        }
        Command::Search { id, query, k } => {
            let chunks = assistant.search(&id, &query, k).await?;
            if chunks.is_empty() {
                println!("No relevant passages found.");
            }
            for (rank, chunk) in chunks.iter().enumerate() {
                print!("#{} ", rank + 1);
                print_chunk_header(chunk.chunk_index, chunk.page_number);
                println!("{}\n", chunk.content);
            }
        }
        Command::Ask { id, question } => {
            print_grounded(&assistant.chat(&id, &question).await?);
        }
        Command::Explain { id, concept } => {
            print_grounded(&assistant.explain_concept(&id, &concept).await?);
        }
        Command::Flashcards { id, count } => {
            let set = assistant.generate_flashcards(&id, count).await?;
            println!("🃏 Flashcard set {} ({} cards)\n", set.id, set.cards.len());
            for card in &set.cards {
                println!("[{}] ({}) Q: {}\n    A: {}\n", card.id, card.difficulty, card.question, card.answer);
            }
        }
        Command::Sets { id } => {
            for set in assistant.flashcard_sets(&id).await? {
                let starred = set.cards.iter().filter(|c| c.is_starred).count();
                let reviews: u32 = set.cards.iter().map(|c| c.review_count).sum();
                println!(
                    "{}  {} cards  {} starred  {} reviews  {}",
                    set.id,
                    set.cards.len(),
                    starred,
                    reviews,
                    set.created_at.format("%Y-%m-%d %H:%M")
                );
            }
        }
        Command::Review { set_id, card_id } => {
            let card = assistant.review_flashcard(&set_id, &card_id).await?;
            println!("✅ Reviewed {} times", card.review_count);
        }
        Command::Star { set_id, card_id } => {
            let card = assistant.toggle_flashcard_star(&set_id, &card_id).await?;
            println!("{}", if card.is_starred { "⭐ Starred" } else { "Unstarred" });
        }
        Command::Quiz {
            id,
            questions,
            title,
        } => {
            let quiz = assistant.generate_quiz(&id, questions, title.as_deref()).await?;
            println!("📝 {} ({})\n", quiz.title, quiz.id);
            for (i, q) in quiz.questions.iter().enumerate() {
                println!("{}. {}", i + 1, q.question);
                for (j, opt) in q.options.iter().enumerate() {
                    println!("   {}) {}", j + 1, opt);
                }
                println!();
            }
        }
        Command::Submit { quiz_id, answers } => {
            let quiz = assistant.quiz(&quiz_id).await?;
            if answers.len() > quiz.questions.len() {
                bail!(
                    "{} answers given but the quiz has {} questions",
                    answers.len(),
                    quiz.questions.len()
                );
            }
            let inputs: Vec<AnswerInput> = answers
                .iter()
                .enumerate()
                .filter(|(_, a)| a.as_str() != "-")
                .map(|(i, a)| {
                    let options = &quiz.questions[i].options;
                    let selected = a
                        .parse::<usize>()
                        .ok()
                        .and_then(|n| n.checked_sub(1))
                        .and_then(|n| options.get(n))
                        .cloned()
                        .unwrap_or_else(|| a.clone());
                    AnswerInput::new(i, selected)
                })
                .collect();
            let quiz = assistant.submit_quiz(&quiz_id, &inputs).await?;
            println!("🎯 Score: {}%", quiz.score);
        }
        Command::Results { quiz_id } => {
            let results = assistant.quiz_results(&quiz_id).await?;
            println!(
                "📝 {}: {}% ({}/{})\n",
                results.title, results.score, results.correct_count, results.total_questions
            );
            for q in &results.questions {
                let mark = if q.is_correct { "✅" } else { "❌" };
                println!("{mark} {}. {}", q.question_index + 1, q.question);
                println!("   your answer: {}", q.selected_answer.as_deref().unwrap_or("-"));
                println!("   correct:     {}", q.correct_answer);
                if !q.explanation.is_empty() {
                    println!("   {}", q.explanation);
                }
            }
        }
        Command::Summary { id } => {
            println!("{}", assistant.summarize(&id).await?);
        }
        Command::History { id } => {
            for turn in assistant.chat_history(&id).await? {
                let who = match turn.role {
                    ChatRole::User => "🧑",
                    ChatRole::Assistant => "🤖",
                };
                println!("{who} {}", turn.content);
                if !turn.relevant_chunks.is_empty() {
                    println!("   chunks: {:?}", turn.relevant_chunks);
                }
            }
        }
        Command::Delete { id } => {
            assistant.delete_document(&id).await?;
            println!("🗑️ Deleted {id}");
        }
    }

    Ok(())
}

fn print_document(doc: &Document) {
    println!(
        "{}  {}  {} chunks  {} bytes  {}",
        doc.id,
        doc.status,
        doc.chunks.len(),
        doc.file_size,
        doc.title
    );
}

fn print_chunk_header(index: usize, page: u32) {
    if page > 0 {
        println!("[chunk {index}, page {page}]");
    } else {
        println!("[chunk {index}]");
    }
}

fn print_grounded(answer: &GroundedAnswer) {
    println!("{}\n", answer.text);
    if !answer.chunks.is_empty() {
        println!("Sources: chunks {:?}", answer.citations());
    }
}
