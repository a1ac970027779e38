use clap::Parser;
use futures::StreamExt;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use summarizer_service_cli::{
    ai::AIAnalyzer,
    config::{OracleConfig, SummarizerConfig},
    emitter::{Cancellation, StreamEvent},
    pipeline::{self, process_article},
    scraper::ArticleFetcher,
    sentiment, utils, Document, Error,
};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Article URL to fetch and summarize
    #[arg(short, long, conflicts_with = "file", required_unless_present = "file")]
    url: Option<String>,

    /// Local HTML file with already pre-filtered article markup
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Title for the metadata event when reading from a file
    #[arg(short, long)]
    title: Option<String>,

    /// Token budget per oracle input
    #[arg(long)]
    chunk_budget: Option<usize>,

    /// Minimum summary length in tokens
    #[arg(long)]
    min_output_len: Option<usize>,

    /// Maximum summary length in tokens
    #[arg(long)]
    max_output_len: Option<usize>,

    /// Concurrent oracle requests
    #[arg(long)]
    batch_size: Option<usize>,

    /// Reduction passes allowed per section
    #[arg(long)]
    max_reduction_depth: Option<usize>,

    /// Strip URLs, e-mails and markup from section text
    #[arg(long)]
    advanced_cleanup: bool,

    /// Where to save the summarized document
    #[arg(short, long, default_value = "result.json")]
    output: PathBuf,

    /// Also save the summary as plain text
    #[arg(long)]
    text_output: Option<PathBuf>,

    /// Skip the event stream and only write the finished document
    #[arg(long)]
    no_stream: bool,

    /// Also analyze comment sentiment (URL mode only)
    #[arg(long)]
    comments: bool,
}

impl Args {
    fn config(&self) -> Result<SummarizerConfig, Error> {
        let mut config = SummarizerConfig::from_env()?;
        if let Some(v) = self.chunk_budget {
            config.chunk_budget = v;
        }
        if let Some(v) = self.min_output_len {
            config.min_output_len = v;
        }
        if let Some(v) = self.max_output_len {
            config.max_output_len = v;
        }
        if let Some(v) = self.batch_size {
            config.batch_size = v;
        }
        if let Some(v) = self.max_reduction_depth {
            config.max_reduction_depth = v;
        }
        config.advanced_cleanup |= self.advanced_cleanup;
        config.validate()?;
        Ok(config)
    }
}

fn plain_text(document: &Document) -> String {
    document
        .sections
        .iter()
        .map(|section| match &section.header {
            Some(header) => format!("{}\n{}\n", header, section.flatten_text()),
            None => format!("{}\n", section.flatten_text()),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Prints every event as a JSON line and returns the finished document.
async fn stream_events(
    markup: &str,
    title: Option<String>,
    analyzer: Arc<AIAnalyzer>,
    config: &SummarizerConfig,
) -> Result<Option<Document>, Box<dyn std::error::Error>> {
    let cancellation = Cancellation::new();
    let ctrl_c = cancellation.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let mut events = Box::pin(process_article(markup, title, analyzer, config, cancellation));
    let mut stdout = std::io::stdout();
    let mut outcome = None;
    while let Some(event) = events.next().await {
        stdout.write_all(event.to_json_line()?.as_bytes())?;
        stdout.flush()?;
        if event.is_terminal() {
            outcome = Some(event);
        }
    }

    match outcome {
        Some(StreamEvent::Complete { result }) => Ok(Some(result)),
        Some(StreamEvent::Error { message }) => {
            error!("summarization failed: {}", message);
            std::process::exit(1);
        }
        _ => Ok(None),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    utils::init_tracing();

    // 1) Configuration: .env, environment, then flags
    let args = Args::parse();
    let config = args.config()?;
    let analyzer = Arc::new(AIAnalyzer::new(OracleConfig::from_env(config.batch_size)?)?);

    // 2) Article markup, from the network or a local file
    let (markup, title, article) = match (&args.url, &args.file) {
        (Some(url), _) => {
            let article = ArticleFetcher::new()?.fetch(url).await?;
            (article.body_markup.clone(), Some(article.title.clone()), Some(article))
        }
        (None, Some(path)) => (std::fs::read_to_string(path)?, args.title.clone(), None),
        (None, None) => return Err("either --url or --file is required".into()),
    };

    // 3) Summarize: either stream events to stdout, one JSON object per line,
    //    or wait for the whole document
    let result = if args.no_stream {
        let document = pipeline::prepare(&markup);
        match pipeline::summarize_document(document, analyzer.as_ref(), &config).await {
            Ok(document) => Some(document),
            Err(e) => {
                error!("summarization failed: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        stream_events(&markup, title, analyzer.clone(), &config).await?
    };

    match result {
        Some(result) => {
            utils::save_json(&result, &args.output)?;
            if let Some(path) = &args.text_output {
                utils::save_text(&plain_text(&result), path)?;
            }
        }
        None => info!("interrupted before completion"),
    }

    // 4) Optional sentiment analysis of the comments
    if args.comments {
        if let Some(article) = article {
            let report = sentiment::aggregate(&article.comments, analyzer.as_ref()).await;
            info!("{}", sentiment::summary_line(&report));
            info!(words = ?sentiment::top_words(&article.comments, 10), "most frequent words");
            if let Some((label, _)) = report.dominant() {
                let words = sentiment::top_words_with_label(&article.comments, label, analyzer.as_ref(), 10).await;
                info!(words = ?words, "most frequent {} words", label);
            }
            utils::save_json(&report, "comments.json")?;
        }
    }

    Ok(())
}
