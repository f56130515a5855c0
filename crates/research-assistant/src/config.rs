//! Configuration for the research assistant service.

use std::time::Duration;

/// Upstream endpoints and client tuning constants.
pub mod api {
    use std::time::Duration;

    /// arXiv Atom query endpoint.
    pub const ARXIV_API: &str = "https://export.arxiv.org/api/query";

    /// Neo4j HTTP endpoint (transactional Cypher API lives under `/db/{name}/tx`).
    pub const NEO4J_URI: &str = "http://localhost:7474";

    /// Default Neo4j user.
    pub const NEO4J_USER: &str = "neo4j";

    /// Default Neo4j database name.
    pub const NEO4J_DATABASE: &str = "neo4j";

    /// Generation engine (Ollama-compatible `/api/generate`).
    pub const GENERATION_URL: &str = "http://localhost:11434";

    /// Default text generation model.
    pub const GENERATION_MODEL: &str = "llama3.2";

    /// Default vision model used to describe embedded figures.
    pub const VISION_MODEL: &str = "llava";

    /// Default embedding model for the HTTP embedder.
    pub const EMBEDDING_MODEL: &str = "all-minilm";

    /// Dimension of the local hashing embedder (matches MiniLM sentence vectors).
    pub const HASHING_DIMENSION: usize = 384;

    /// Request timeout (generation calls can be slow on CPU).
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(180);

    /// Connection timeout.
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// arXiv asks clients to wait three seconds between calls.
    pub const ARXIV_RATE_LIMIT: Duration = Duration::from_secs(3);

    /// Maximum retries for transient upstream failures.
    pub const MAX_RETRIES: u32 = 5;

    /// Base delay for exponential backoff.
    pub const RETRY_DELAY: Duration = Duration::from_secs(1);

    /// Cache TTL (5 minutes).
    pub const CACHE_TTL: Duration = Duration::from_secs(300);

    /// Maximum cache size.
    pub const CACHE_MAX_SIZE: u64 = 1000;

    /// Maximum keepalive connections.
    pub const MAX_KEEPALIVE: usize = 10;

    /// Keepalive expiry.
    pub const KEEPALIVE_EXPIRY: Duration = Duration::from_secs(30);

    /// Largest PDF we are willing to download (50 MiB).
    pub const MAX_PDF_BYTES: usize = 50 * 1024 * 1024;

    /// Papers processed concurrently during ingestion.
    pub const INGEST_CONCURRENCY: usize = 4;

    /// Most results the arXiv API returns for a single query.
    pub const ARXIV_MAX_RESULTS: usize = 2000;
}

/// Question words that mark a question as being about a figure.
pub const DEFAULT_FIGURE_KEYWORDS: &[&str] = &["image", "figure", "chart", "graph", "diagram", "plot"];

/// Which paper store backend to run against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum StoreBackend {
    /// In-process property graph (lost on restart).
    #[default]
    Memory,
    /// Neo4j over its HTTP transactional endpoint.
    Neo4j,
}

/// Where the generation engine should run its model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum GenerationDevice {
    /// Let the engine pick an accelerator when one is available.
    #[default]
    Auto,
    /// Force general-purpose CPU execution.
    Cpu,
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Store backend selection.
    pub store_backend: StoreBackend,

    /// Neo4j HTTP base URI.
    pub neo4j_uri: String,

    /// Neo4j user.
    pub neo4j_user: String,

    /// Neo4j password.
    pub neo4j_password: String,

    /// Neo4j database name.
    pub neo4j_database: String,

    /// arXiv query endpoint (for testing with mock servers).
    pub arxiv_api_url: String,

    /// Generation engine base URL.
    pub generation_url: String,

    /// Generation model name.
    pub generation_model: String,

    /// Generation device preference.
    pub generation_device: GenerationDevice,

    /// Vision model used to describe figures. `None` disables image captioning.
    pub vision_model: Option<String>,

    /// OpenAI-compatible embeddings base URL. `None` selects the local hashing embedder.
    pub embedding_url: Option<String>,

    /// Embedding model name.
    pub embedding_model: String,

    /// Embedding API key (optional).
    pub embedding_api_key: Option<String>,

    /// Bearer token required on API requests (optional).
    pub auth_token: Option<String>,

    /// Request timeout.
    pub request_timeout: Duration,

    /// Connection timeout.
    pub connect_timeout: Duration,

    /// Retry count for transient upstream failures.
    pub max_retries: u32,

    /// Base backoff delay between retries.
    pub retry_delay: Duration,

    /// Minimum period between arXiv requests.
    pub arxiv_rate_limit: Duration,

    /// Cache TTL.
    pub cache_ttl: Duration,

    /// Maximum cache size.
    pub cache_max_size: u64,

    /// PDF download size cap in bytes.
    pub max_pdf_bytes: usize,

    /// Papers processed concurrently during ingestion.
    pub ingest_concurrency: usize,

    /// Keywords that route a question through the image captioner.
    pub figure_keywords: Vec<String>,
}

impl Config {
    /// Create a configuration with default endpoints and the given Neo4j password.
    #[must_use]
    pub fn new(neo4j_password: impl Into<String>) -> Self {
        Self {
            store_backend: StoreBackend::Memory,
            neo4j_uri: api::NEO4J_URI.to_string(),
            neo4j_user: api::NEO4J_USER.to_string(),
            neo4j_password: neo4j_password.into(),
            neo4j_database: api::NEO4J_DATABASE.to_string(),
            arxiv_api_url: api::ARXIV_API.to_string(),
            generation_url: api::GENERATION_URL.to_string(),
            generation_model: api::GENERATION_MODEL.to_string(),
            generation_device: GenerationDevice::Auto,
            vision_model: Some(api::VISION_MODEL.to_string()),
            embedding_url: None,
            embedding_model: api::EMBEDDING_MODEL.to_string(),
            embedding_api_key: None,
            auth_token: None,
            request_timeout: api::REQUEST_TIMEOUT,
            connect_timeout: api::CONNECT_TIMEOUT,
            max_retries: api::MAX_RETRIES,
            retry_delay: api::RETRY_DELAY,
            arxiv_rate_limit: api::ARXIV_RATE_LIMIT,
            cache_ttl: api::CACHE_TTL,
            cache_max_size: api::CACHE_MAX_SIZE,
            max_pdf_bytes: api::MAX_PDF_BYTES,
            ingest_concurrency: api::INGEST_CONCURRENCY,
            figure_keywords: DEFAULT_FIGURE_KEYWORDS.iter().map(ToString::to_string).collect(),
        }
    }

    /// Create a test configuration with every upstream pointed at one mock server.
    #[must_use]
    pub fn for_testing(base_url: &str) -> Self {
        Self {
            store_backend: StoreBackend::Memory,
            neo4j_uri: base_url.to_string(),
            neo4j_user: "neo4j".to_string(),
            neo4j_password: "test".to_string(),
            neo4j_database: "neo4j".to_string(),
            arxiv_api_url: format!("{}/api/query", base_url),
            generation_url: base_url.to_string(),
            generation_model: "test-model".to_string(),
            generation_device: GenerationDevice::Auto,
            vision_model: None,
            embedding_url: None,
            embedding_model: "test-embedding".to_string(),
            embedding_api_key: None,
            auth_token: None,
            request_timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(2),
            max_retries: 0, // Fail fast in tests
            retry_delay: Duration::from_millis(0),
            arxiv_rate_limit: Duration::from_millis(0),
            cache_ttl: Duration::from_secs(0), // No caching in tests
            cache_max_size: 0,
            max_pdf_bytes: 1024 * 1024,
            ingest_concurrency: 2,
            figure_keywords: DEFAULT_FIGURE_KEYWORDS.iter().map(ToString::to_string).collect(),
        }
    }

    /// Create configuration from environment variables.
    ///
    /// Variables that are unset keep their defaults; a `.env` file in the
    /// working directory is loaded first.
    ///
    /// # Errors
    ///
    /// Returns error if a numeric or enum variable cannot be parsed.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Create configuration from a variable lookup (`from_env` with the
    /// process environment as the source).
    ///
    /// Durations are given in (fractional) seconds.
    ///
    /// # Errors
    ///
    /// Returns error if a numeric or enum variable cannot be parsed.
    pub fn from_vars<F>(var: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let or = |key: &str, default: &str| var(key).unwrap_or_else(|| default.to_string());

        let mut config = Self::new(or("NEO4J_PASSWORD", ""));

        if let Some(backend) = var("STORE_BACKEND") {
            config.store_backend = <StoreBackend as clap::ValueEnum>::from_str(&backend, true)
                .map_err(|e| anyhow::anyhow!("invalid STORE_BACKEND '{backend}': {e}"))?;
        }
        if let Some(device) = var("GENERATION_DEVICE") {
            config.generation_device =
                <GenerationDevice as clap::ValueEnum>::from_str(&device, true)
                    .map_err(|e| anyhow::anyhow!("invalid GENERATION_DEVICE '{device}': {e}"))?;
        }

        config.neo4j_uri = or("NEO4J_URI", &config.neo4j_uri);
        config.neo4j_user = or("NEO4J_USER", &config.neo4j_user);
        config.neo4j_database = or("NEO4J_DATABASE", &config.neo4j_database);
        config.arxiv_api_url = or("ARXIV_API_URL", &config.arxiv_api_url);
        config.generation_url = or("GENERATION_URL", &config.generation_url);
        config.generation_model = or("GENERATION_MODEL", &config.generation_model);
        config.embedding_model = or("EMBEDDING_MODEL", &config.embedding_model);

        if let Some(model) = var("VISION_MODEL") {
            config.vision_model = (!model.is_empty()).then_some(model);
        }
        config.embedding_url = var("EMBEDDING_URL").filter(|v| !v.is_empty());
        config.embedding_api_key = var("EMBEDDING_API_KEY");
        config.auth_token = var("API_AUTH_TOKEN").filter(|v| !v.is_empty());

        if let Some(retries) = var("MAX_RETRIES") {
            config.max_retries = retries.parse()?;
        }
        if let Some(delay) = var("RETRY_DELAY") {
            config.retry_delay = parse_secs("RETRY_DELAY", &delay)?;
        }
        if let Some(timeout) = var("REQUEST_TIMEOUT") {
            config.request_timeout = parse_secs("REQUEST_TIMEOUT", &timeout)?;
        }
        if let Some(timeout) = var("CONNECT_TIMEOUT") {
            config.connect_timeout = parse_secs("CONNECT_TIMEOUT", &timeout)?;
        }
        if let Some(ttl) = var("CACHE_TTL") {
            config.cache_ttl = parse_secs("CACHE_TTL", &ttl)?;
        }
        if let Some(size) = var("CACHE_MAX_SIZE") {
            config.cache_max_size = size.parse()?;
        }
        if let Some(period) = var("ARXIV_RATE_LIMIT") {
            config.arxiv_rate_limit = parse_secs("ARXIV_RATE_LIMIT", &period)?;
        }
        if let Some(bytes) = var("MAX_PDF_BYTES") {
            config.max_pdf_bytes = bytes.parse()?;
        }
        if let Some(concurrency) = var("INGEST_CONCURRENCY") {
            config.ingest_concurrency = concurrency.parse::<usize>()?.max(1);
        }
        if let Some(keywords) = var("FIGURE_KEYWORDS") {
            config.figure_keywords = keywords
                .split(',')
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect();
        }

        Ok(config)
    }

    /// Check if the API requires a bearer token.
    #[must_use]
    pub const fn has_auth_token(&self) -> bool {
        self.auth_token.is_some()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new("")
    }
}

fn parse_secs(key: &str, value: &str) -> anyhow::Result<Duration> {
    let secs: f64 = value
        .trim()
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid {key} '{value}': {e}"))?;
    Ok(Duration::try_from_secs_f64(secs)?)
}
