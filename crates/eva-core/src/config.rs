//! Runtime configuration.
//!
//! Built once at process start ([`EvaConfig::from_env`] or
//! [`EvaConfig::load`]) and passed by reference or `Arc` into every
//! component constructor. Nothing below the binary reads the environment.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::media_paths::DEFAULT_URL_PREFIX;
use crate::models::media::MediaKind;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaConfig {
    pub pricing: Pricing,
    pub credentials: Credentials,
    pub providers: ProviderSettings,
    pub polling: PollingConfig,
    pub media: MediaConfig,
    pub prompts: Prompts,
    pub server: ServerConfig,
}

impl EvaConfig {
    /// Read a JSON config file. Missing sections take their defaults.
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let contents = std::fs::read_to_string(path)?;
        let config: EvaConfig = serde_json::from_str(&contents)?;
        tracing::info!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// Build the config from process environment variables.
    ///
    /// If `EVA_CONFIG` names a JSON file it is loaded first and the
    /// remaining variables override it.
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`EvaConfig::from_env`] but with an injectable lookup, so the
    /// override rules can be exercised without touching the real environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup("EVA_CONFIG") {
            Some(path) if !path.is_empty() => Self::load(Path::new(&path))?,
            _ => Self::default(),
        };
        config.apply_overrides(&lookup)?;
        Ok(config)
    }

    fn apply_overrides<F>(&mut self, lookup: &F) -> Result<(), CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("DEEPSEEK_API_KEY") {
            self.credentials.deepseek = ApiKey::from(Some(v));
        }
        if let Some(v) = lookup("FAL_API_KEY") {
            self.credentials.fal = ApiKey::from(Some(v));
        }
        if let Some(v) = lookup("KIE_API_KEY") {
            self.credentials.kie = ApiKey::from(Some(v));
        }
        if let Some(v) = lookup("RUNPOD_API_KEY") {
            self.credentials.runpod = ApiKey::from(Some(v));
        }
        if let Some(v) = lookup("JWT_SECRET") {
            self.server.jwt_secret = v;
        }
        if let Some(v) = lookup("EVA_BIND_ADDR") {
            self.server.bind_addr = v;
        }
        if let Some(v) = lookup("EVA_LEDGER_PATH") {
            self.server.ledger_path = PathBuf::from(v);
        }

        if let Some(v) = lookup("EVA_IMAGE_PRICE") {
            self.pricing.image_generation = parse_value("EVA_IMAGE_PRICE", &v)?;
        }
        if let Some(v) = lookup("EVA_VIDEO_PRICE") {
            self.pricing.video_generation = parse_value("EVA_VIDEO_PRICE", &v)?;
        }
        if let Some(v) = lookup("EVA_INITIAL_BALANCE") {
            self.pricing.initial_balance = parse_value("EVA_INITIAL_BALANCE", &v)?;
        }
        if let Some(v) = lookup("EVA_REFUND_ON_FAILURE") {
            self.pricing.refund_on_failure = parse_value("EVA_REFUND_ON_FAILURE", &v)?;
        }

        if let Some(v) = lookup("EVA_IMAGE_CREATE_PROVIDER") {
            self.providers.image_create = v.parse()?;
        }
        if let Some(v) = lookup("EVA_IMAGE_EDIT_PROVIDER") {
            self.providers.image_edit = v.parse()?;
        }
        if let Some(v) = lookup("EVA_VIDEO_PROVIDER") {
            self.providers.video = v.parse()?;
        }
        if let Some(v) = lookup("KIE_API_BASE_URL") {
            self.providers.kie.base_url = v;
        }
        if let Some(v) = lookup("RUNPOD_API_BASE_URL") {
            self.providers.runpod.base_url = v;
        }
        if let Some(v) = lookup("FAL_API_BASE_URL") {
            self.providers.fal.base_url = v;
        }
        if let Some(v) = lookup("DEEPSEEK_API_BASE_URL") {
            self.providers.deepseek.base_url = v;
        }

        if let Some(v) = lookup("EVA_MEDIA_ROOT") {
            self.media.root = PathBuf::from(v);
        }
        if let Some(v) = lookup("EVA_PUBLIC_BASE_URL") {
            self.media.public_base_url = non_empty(v);
        }
        if let Some(v) = lookup("EVA_S3_BUCKET") {
            self.media.s3_bucket = non_empty(v);
        }
        if let Some(v) = lookup("EVA_S3_PUBLIC_BASE_URL") {
            self.media.s3_public_base_url = non_empty(v);
        }

        Ok(())
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, CoreError> {
    value.trim().parse().map_err(|_| CoreError::InvalidConfig {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() { None } else { Some(value) }
}

// ── Pricing ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Pricing {
    pub image_generation: Decimal,
    pub video_generation: Decimal,
    /// Balance granted when an account is opened.
    pub initial_balance: Decimal,
    /// Credit the price back when a charged request yields no artifact.
    /// Off by default.
    pub refund_on_failure: bool,
}

impl Default for Pricing {
    fn default() -> Self {
        Self {
            image_generation: Decimal::ONE,
            video_generation: Decimal::TEN,
            initial_balance: Decimal::ONE_HUNDRED,
            refund_on_failure: false,
        }
    }
}

impl Pricing {
    /// Price charged for one generation of `kind`.
    pub fn price_for(&self, kind: MediaKind) -> Decimal {
        match kind {
            MediaKind::Image => self.image_generation,
            MediaKind::Video => self.video_generation,
        }
    }
}

// ── Credentials ──────────────────────────────────────────────────────────────

/// A provider secret. Empty values and the `your_…_here` placeholders
/// shipped in example env files both count as unset.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub struct ApiKey(Option<String>);

impl ApiKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self::from(Some(value.into()))
    }

    pub fn unset() -> Self {
        Self(None)
    }

    pub fn get(&self) -> Option<&str> {
        self.0.as_deref()
    }

    pub fn is_set(&self) -> bool {
        self.0.is_some()
    }
}

pub fn is_placeholder(value: &str) -> bool {
    let v = value.trim();
    v.is_empty() || (v.starts_with("your_") && v.ends_with("_here"))
}

impl From<Option<String>> for ApiKey {
    fn from(value: Option<String>) -> Self {
        Self(value.filter(|v| !is_placeholder(v)))
    }
}

impl From<ApiKey> for Option<String> {
    fn from(key: ApiKey) -> Self {
        key.0
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Some(key) => write!(f, "ApiKey({})", redact(key)),
            None => f.write_str("ApiKey(unset)"),
        }
    }
}

fn redact(key: &str) -> String {
    if key.len() <= 8 {
        return "****".to_string();
    }
    match (key.get(..4), key.get(key.len() - 4..)) {
        (Some(prefix), Some(suffix)) => format!("{prefix}...{suffix}"),
        _ => "****".to_string(),
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub deepseek: ApiKey,
    pub fal: ApiKey,
    pub kie: ApiKey,
    pub runpod: ApiKey,
}

// ── Providers ────────────────────────────────────────────────────────────────

/// Concrete media provider backing a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Kie,
    RunPod,
    Fal,
}

impl FromStr for ProviderKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "kie" => Ok(Self::Kie),
            "runpod" | "run_pod" => Ok(Self::RunPod),
            "fal" => Ok(Self::Fal),
            other => Err(CoreError::UnknownProvider(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// Text-to-image provider.
    pub image_create: ProviderKind,
    /// Image-to-image provider, used when a base image is supplied.
    pub image_edit: ProviderKind,
    /// Image-to-video provider.
    pub video: ProviderKind,
    pub kie: KieSettings,
    pub runpod: RunPodSettings,
    pub fal: FalSettings,
    pub deepseek: DeepSeekSettings,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            image_create: ProviderKind::Kie,
            image_edit: ProviderKind::RunPod,
            video: ProviderKind::Kie,
            kie: KieSettings::default(),
            runpod: RunPodSettings::default(),
            fal: FalSettings::default(),
            deepseek: DeepSeekSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KieSettings {
    pub base_url: String,
    pub image_model: String,
    pub video_model: String,
    pub aspect_ratio: String,
    pub video_duration: String,
    pub video_resolution: String,
    pub multi_shots: bool,
}

impl Default for KieSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.kie.ai".to_string(),
            image_model: "z-image".to_string(),
            video_model: "wan/2-6-image-to-video".to_string(),
            aspect_ratio: "1:1".to_string(),
            video_duration: "5".to_string(),
            video_resolution: "720p".to_string(),
            multi_shots: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunPodSettings {
    pub base_url: String,
    pub edit_endpoint: String,
    pub size: String,
}

impl Default for RunPodSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.runpod.ai".to_string(),
            edit_endpoint: "seedream-v4-edit".to_string(),
            size: "2048*2048".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FalSettings {
    pub base_url: String,
    pub image_model: String,
    pub edit_model: String,
    pub video_model: String,
}

impl Default for FalSettings {
    fn default() -> Self {
        Self {
            base_url: "https://fal.run".to_string(),
            image_model: "fal-ai/flux/dev".to_string(),
            edit_model: "fal-ai/flux/dev/image-to-image".to_string(),
            video_model: "fal-ai/kling-video/v1/standard/image-to-video".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeepSeekSettings {
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
}

impl Default for DeepSeekSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.deepseek.com".to_string(),
            model: "deepseek-chat".to_string(),
            max_tokens: 1000,
        }
    }
}

// ── Polling ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub image_interval_ms: u64,
    pub image_max_attempts: u32,
    pub video_interval_ms: u64,
    pub video_max_attempts: u32,
    /// Whole-request deadline enforced by the HTTP layer.
    pub image_deadline_secs: u64,
    pub video_deadline_secs: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            image_interval_ms: 3_000,
            image_max_attempts: 20,
            video_interval_ms: 10_000,
            video_max_attempts: 30,
            image_deadline_secs: 300,
            video_deadline_secs: 900,
        }
    }
}

impl PollingConfig {
    pub fn interval(&self, kind: MediaKind) -> Duration {
        match kind {
            MediaKind::Image => Duration::from_millis(self.image_interval_ms),
            MediaKind::Video => Duration::from_millis(self.video_interval_ms),
        }
    }

    pub fn max_attempts(&self, kind: MediaKind) -> u32 {
        match kind {
            MediaKind::Image => self.image_max_attempts,
            MediaKind::Video => self.video_max_attempts,
        }
    }

    pub fn deadline(&self, kind: MediaKind) -> Duration {
        match kind {
            MediaKind::Image => Duration::from_secs(self.image_deadline_secs),
            MediaKind::Video => Duration::from_secs(self.video_deadline_secs),
        }
    }
}

// ── Media storage ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Local directory holding the `images/` and `videos/` namespaces.
    pub root: PathBuf,
    /// Path prefix the media root is served under.
    pub url_prefix: String,
    /// When set, artifact URLs are fully qualified under this host instead
    /// of root-relative.
    pub public_base_url: Option<String>,
    /// When set, artifacts go to this S3 bucket instead of the local root.
    pub s3_bucket: Option<String>,
    pub s3_public_base_url: Option<String>,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("uploads"),
            url_prefix: DEFAULT_URL_PREFIX.to_string(),
            public_base_url: None,
            s3_bucket: None,
            s3_public_base_url: None,
        }
    }
}

// ── Prompts ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Prompts {
    /// Asks the text model for a persona as a JSON object with
    /// `appearance`, `personality` and `firstMessage`.
    pub persona: String,
    /// Appended to the persona's appearance to build the avatar prompt.
    pub avatar_suffix: String,
    /// `{text}` is replaced with the line the companion speaks.
    pub spoken_video: String,
    pub names: Vec<String>,
}

impl Default for Prompts {
    fn default() -> Self {
        Self {
            persona: PERSONA_PROMPT.to_string(),
            avatar_suffix: "portrait, high quality".to_string(),
            spoken_video: "girl says: \"{text}\"".to_string(),
            names: DEFAULT_NAMES.iter().map(|n| n.to_string()).collect(),
        }
    }
}

const PERSONA_PROMPT: &str = "\
Invent a unique virtual girlfriend. Respond with a single JSON object and nothing else, \
using exactly these fields:
{
  \"appearance\": \"one sentence describing her looks: hair, eyes, body type, style\",
  \"personality\": [\"three\", \"short\", \"traits\"],
  \"firstMessage\": \"the first flirty message she sends, max 20 words\"
}";

const DEFAULT_NAMES: &[&str] = &[
    "Emma", "Olivia", "Ava", "Isabella", "Sophia", "Charlotte", "Mia", "Amelia", "Harper",
    "Evelyn", "Abigail", "Emily", "Elizabeth", "Sofia", "Grace", "Avery", "Scarlett",
    "Victoria", "Aria", "Lily", "Chloe", "Zoey", "Penelope", "Hannah", "Nora", "Lillian",
    "Addison", "Aubrey", "Ellie", "Stella", "Natalie", "Leah", "Zoe", "Brooklyn", "Savannah",
    "Audrey", "Claire", "Bella", "Skylar", "Lucy", "Anna", "Samantha", "Caroline", "Genesis",
    "Aaliyah", "Kennedy", "Allison", "Gabriella", "Madelyn", "Maya",
];

// ── Server ───────────────────────────────────────────────────────────────────

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// HS256 secret used to verify bearer tokens.
    pub jwt_secret: String,
    /// JSON snapshot holding users, transactions and companions.
    pub ledger_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            jwt_secret: String::new(),
            ledger_path: PathBuf::from("data/ledger.json"),
        }
    }
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("bind_addr", &self.bind_addr)
            .field("jwt_secret", &redact(&self.jwt_secret))
            .field("ledger_path", &self.ledger_path)
            .finish()
    }
}
