use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use chatwarden_ai::{LlmClassifier, OpenAIProvider, ProviderConfig, RetryPolicy};
use chatwarden_common::traits::ChatTransport;
use chatwarden_core::config::{PipelineConfig, PollConfig, ProcessorConfig};
use chatwarden_core::eventbus::EventBus;
use chatwarden_core::ledger::CsvLedger;
use chatwarden_core::novelty::QuoteBook;
use chatwarden_core::pipeline::ClassifierPipeline;
use chatwarden_core::platforms::widget::WebDriverClient;
use chatwarden_core::platforms::{
    FailoverTransport, WidgetConfig, WidgetTransport, YouTubeChatFeed, YouTubeConfig,
};
use chatwarden_core::responder::Responder;
use chatwarden_core::tasks::{spawn_poll_loop, ChatProcessor, PollLoop};
use chatwarden_core::{DefaultHttpClient, Error, HttpClient};

mod display;
use display::spawn_display;

#[derive(Parser, Debug, Clone)]
#[command(name = "chatwarden")]
#[command(author, version, about = "chatwarden - live chat moderation, rewards and leaderboards")]
struct Args {
    /// YouTube Data API key for the primary chat feed
    #[arg(long, env = "YOUTUBE_API_KEY", hide_env_values = true)]
    youtube_api_key: Option<String>,

    /// Channel whose live broadcast chat is followed
    #[arg(long, env = "YOUTUBE_CHANNEL_ID")]
    youtube_channel_id: Option<String>,

    /// Embeddable chat widget scraped when the feed is unavailable. Required
    /// when no YouTube credentials are given or with --start-on-fallback.
    #[arg(long, env = "CHAT_WIDGET_URL")]
    widget_url: Option<String>,

    /// WebDriver endpoint (chromedriver) used to render the widget
    #[arg(long, env = "WEBDRIVER_URL", default_value = "http://localhost:9515")]
    webdriver_url: String,

    /// Skip the YouTube feed and read the widget from the start
    #[arg(long, env = "CHATWARDEN_START_ON_FALLBACK", default_value = "false")]
    start_on_fallback: bool,

    #[arg(long, env = "CHATWARDEN_POLL_INTERVAL_MS", default_value_t = 2000)]
    poll_interval_ms: u64,

    #[arg(long, env = "CHATWARDEN_FALLBACK_INTERVAL_MS", default_value_t = 500)]
    fallback_interval_ms: u64,

    /// Wait between discovery attempts while nothing is live
    #[arg(long, env = "CHATWARDEN_IDLE_INTERVAL_SECS", default_value_t = 30)]
    idle_interval_secs: u64,

    #[arg(long, env = "CHATWARDEN_DEDUP_CAPACITY", default_value_t = 100)]
    dedup_capacity: usize,

    #[arg(long, env = "CHATWARDEN_TRIGGER", default_value = "777")]
    trigger: String,

    #[arg(long, env = "CHATWARDEN_POINTS_PER_REWARD", default_value_t = 0.5)]
    points_per_reward: f64,

    #[arg(long, env = "CHATWARDEN_MAX_POINTS_PER_DAY", default_value_t = 5.0)]
    max_points_per_day: f64,

    #[arg(
        long,
        env = "CHATWARDEN_IGNORED_USERS",
        value_delimiter = ',',
        default_value = "Nightbot,StreamElements,Restream.io"
    )]
    ignored_users: Vec<String>,

    #[arg(
        long,
        env = "CHATWARDEN_SENSITIVE_TOKENS",
        value_delimiter = ',',
        default_value = "api,key,token,secret"
    )]
    sensitive_tokens: Vec<String>,

    #[arg(long, env = "CHATWARDEN_LEADERBOARD_EVERY", default_value_t = 10)]
    leaderboard_every: usize,

    #[arg(long, env = "CHATWARDEN_LEADERBOARD_SIZE", default_value_t = 3)]
    leaderboard_size: usize,

    #[arg(long, env = "CHATWARDEN_CHAT_MEMORY_SIZE", default_value_t = 30)]
    chat_memory_size: usize,

    #[arg(long, env = "CHATWARDEN_LEDGER_PATH", default_value = "data/chat_history.csv")]
    ledger_path: PathBuf,

    #[arg(long, env = "CHATWARDEN_QUOTES_PATH", default_value = "data/quotes_and_verses.txt")]
    quotes_path: PathBuf,

    /// OpenAI-compatible chat completions base URL
    #[arg(long, env = "LLM_BASE_URL", default_value = "https://api.groq.com/openai/v1")]
    llm_base_url: String,

    #[arg(long, env = "LLM_API_KEY", hide_env_values = true)]
    llm_api_key: String,

    #[arg(long, env = "LLM_MODEL", default_value = "llama-3.3-70b-versatile")]
    llm_model: String,

    /// Cutoff for graded (numeric) moderation replies
    #[arg(long, env = "CHATWARDEN_MODERATION_THRESHOLD", default_value_t = 0.3)]
    moderation_threshold: f64,

    #[arg(long, env = "CHATWARDEN_HTTP_TIMEOUT_SECS", default_value_t = 30)]
    http_timeout_secs: u64,
}

impl Args {
    fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            trigger: self.trigger.clone(),
            points_per_reward: self.points_per_reward,
            max_points_per_day: self.max_points_per_day,
            ignored_users: self.ignored_users.clone(),
            sensitive_tokens: self.sensitive_tokens.iter().map(|t| t.to_lowercase()).collect(),
            chat_memory_size: self.chat_memory_size,
            ..PipelineConfig::default()
        }
    }

    fn processor_config(&self) -> ProcessorConfig {
        ProcessorConfig {
            dedup_capacity: self.dedup_capacity,
            leaderboard_every: self.leaderboard_every,
            leaderboard_size: self.leaderboard_size,
        }
    }

    fn poll_config(&self) -> PollConfig {
        PollConfig {
            primary_interval: Duration::from_millis(self.poll_interval_ms),
            fallback_interval: Duration::from_millis(self.fallback_interval_ms),
            idle_interval: Duration::from_secs(self.idle_interval_secs),
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::from_default_env()
        .add_directive("chatwarden=info".parse().unwrap_or_default());
    fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();
    let args = Args::parse();
    info!(
        "chatwarden starting. fallback_only={}, trigger={}, ledger={}",
        args.start_on_fallback,
        args.trigger,
        args.ledger_path.display()
    );

    if let Err(e) = run(args).await {
        error!("chatwarden stopped: {}", e);
        return Err(e.into());
    }
    info!("Main finished. Goodbye!");
    Ok(())
}

fn build_transport(args: &Args, http: Arc<dyn HttpClient>) -> Result<FailoverTransport, Error> {
    let fallback: Option<Box<dyn ChatTransport>> = args.widget_url.as_ref().map(|url| {
        let driver = WebDriverClient::new(args.webdriver_url.clone(), http.clone());
        Box::new(WidgetTransport::new(WidgetConfig::new(url.clone()), Box::new(driver)))
            as Box<dyn ChatTransport>
    });

    let primary: Option<Box<dyn ChatTransport>> = match (&args.youtube_api_key, &args.youtube_channel_id) {
        _ if args.start_on_fallback => None,
        (Some(key), Some(channel)) => Some(Box::new(YouTubeChatFeed::new(
            YouTubeConfig::new(key.clone(), channel.clone()),
            http,
        ))),
        (None, None) => None,
        _ => {
            return Err(Error::Config(
                "YOUTUBE_API_KEY and YOUTUBE_CHANNEL_ID must be set together".into(),
            ));
        }
    };

    match (primary, fallback) {
        (Some(primary), Some(fallback)) => Ok(FailoverTransport::new(primary, fallback)),
        (Some(primary), None) => {
            warn!("No CHAT_WIDGET_URL configured; quota exhaustion will pause chat instead of failing over");
            Ok(FailoverTransport::primary_only(primary))
        }
        (None, Some(fallback)) => {
            info!("Reading chat from the widget only");
            Ok(FailoverTransport::fallback_only(fallback))
        }
        (None, None) => Err(Error::Config(
            "CHAT_WIDGET_URL is required without YouTube credentials or with --start-on-fallback".into(),
        )),
    }
}

async fn run(args: Args) -> Result<(), Error> {
    let http: Arc<dyn HttpClient> =
        Arc::new(DefaultHttpClient::with_timeout(Duration::from_secs(args.http_timeout_secs))?);
    let bus = EventBus::new();

    // Display subscribes first so the opening leaderboard is not missed; it
    // drains whatever is queued once the bus is closed at shutdown.
    let display = spawn_display(bus.subscribe(None).await);

    let transport = build_transport(&args, http.clone())?;

    let provider = OpenAIProvider::new(
        ProviderConfig {
            provider_type: "openai-compatible".to_string(),
            api_base: Some(args.llm_base_url.clone()),
            api_key: args.llm_api_key.clone(),
            default_model: args.llm_model.clone(),
            options: HashMap::new(),
        },
        http.clone(),
    );
    let classifier = Arc::new(LlmClassifier::new(Arc::new(provider), args.moderation_threshold));

    let quotes = QuoteBook::load(&args.quotes_path).await;
    let pipeline = ClassifierPipeline::new(args.pipeline_config(), classifier, RetryPolicy::default(), quotes);

    let ledger = Arc::new(CsvLedger::new(args.ledger_path.clone()));
    let responder = Responder::new(ledger, bus.clone(), args.points_per_reward);
    let processor = ChatProcessor::new(args.processor_config(), pipeline, responder);

    let (tx, rx) = mpsc::channel(64);
    let poll = PollLoop::new(transport, args.poll_config(), bus.clone());
    let poll_handle = spawn_poll_loop(poll, tx, bus.shutdown_rx.clone());

    {
        let bus = bus.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Ctrl-C received, shutting down");
                bus.shutdown();
            }
        });
    }

    let result = processor.run(rx, bus.shutdown_rx.clone()).await;

    bus.shutdown();
    if let Err(e) = poll_handle.await {
        error!("Poll loop task failed: {}", e);
    }
    bus.close().await;
    if let Err(e) = display.await {
        error!("Display task failed: {}", e);
    }
    result
}
