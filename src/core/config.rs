//! Startup configuration.
//!
//! Everything here is read once when the process starts and is immutable
//! afterwards. Relative paths in `pagecast.yaml` resolve against the
//! directory holding that file.

use serde::Deserialize;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::ai::prompt_builder::PromptTemplate;
use crate::errors::PipelineError;

const CONFIG_FILE_NAME: &str = "pagecast.yaml";

/// An API key. Deliberately has no `Display` and a redacted `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into().trim().to_string();
        if value.is_empty() { None } else { Some(Self(value)) }
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5000".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PromptSettings {
    pub path: PathBuf,
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("prompt_config.yaml"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractorSettings {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for ExtractorSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: "Mozilla/5.0 (compatible; pagecast/0.1; webpage summarizer)".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeminiSettings {
    pub model: String,
    pub endpoint: String,
    pub api_key_env: String,
    pub api_key_file: Option<PathBuf>,
    pub timeout_secs: u64,
    pub max_output_tokens: Option<u32>,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-pro-preview-03-25".into(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".into(),
            api_key_env: "GEMINI_API_KEY".into(),
            api_key_file: Some(PathBuf::from("api_key.txt")),
            timeout_secs: 120,
            max_output_tokens: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OpenRouterSettings {
    pub model: String,
    pub endpoint: String,
    pub api_key_env: String,
    pub api_key_file: Option<PathBuf>,
    pub timeout_secs: u64,
    pub max_output_tokens: Option<u32>,
    pub referer: Option<String>,
    pub title: String,
}

impl Default for OpenRouterSettings {
    fn default() -> Self {
        Self {
            model: "google/gemini-2.0-flash-exp:free".into(),
            endpoint: "https://openrouter.ai/api/v1/chat/completions".into(),
            api_key_env: "OPENROUTER_API_KEY".into(),
            api_key_file: Some(PathBuf::from("openrouter_api_key.txt")),
            timeout_secs: 120,
            max_output_tokens: None,
            referer: None,
            title: "Webpage Summarizer".into(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub gemini: GeminiSettings,
    pub openrouter: OpenRouterSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TtsSettings {
    pub url: String,
    pub ref_audio_path: PathBuf,
    pub text_lang: String,
    pub prompt_lang: String,
    pub text_split_method: String,
    pub batch_size: u32,
    pub media_type: String,
    pub timeout_secs: u64,
}

impl Default for TtsSettings {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:9880/tts".into(),
            ref_audio_path: PathBuf::from("ref_audio.wav"),
            text_lang: "zh".into(),
            prompt_lang: "auto".into(),
            text_split_method: "cut5".into(),
            batch_size: 1,
            media_type: "wav".into(),
            timeout_secs: 300,
        }
    }
}

/// Raw contents of `pagecast.yaml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub prompts: PromptSettings,
    pub extractor: ExtractorSettings,
    pub providers: ProviderSettings,
    pub tts: TtsSettings,
}

impl Settings {
    /// Loads settings from `path`, or from the first existing standard
    /// location:
    /// 1. ./pagecast.yaml
    /// 2. ~/.config/pagecast/pagecast.yaml
    ///
    /// Returns the settings together with the directory relative paths
    /// resolve against.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if an explicit path is missing or any file
    /// fails to parse. No file at the standard locations means defaults.
    pub fn load(path: Option<&Path>) -> Result<(Self, PathBuf), PipelineError> {
        let cwd = std::env::current_dir()
            .map_err(|e| PipelineError::Configuration(format!("current directory: {e}")))?;

        let resolved = match path {
            Some(p) => {
                if !p.exists() {
                    return Err(PipelineError::Configuration(format!(
                        "config file not found: {}",
                        p.display()
                    )));
                }
                Some(p.to_path_buf())
            }
            None => {
                let candidates = [
                    Some(cwd.join(CONFIG_FILE_NAME)),
                    dirs::config_dir().map(|d| d.join("pagecast").join(CONFIG_FILE_NAME)),
                ];
                candidates.into_iter().flatten().find(|p| p.exists())
            }
        };

        let Some(config_path) = resolved else {
            info!("No config file found, using defaults");
            return Ok((Self::default(), cwd));
        };

        let contents = std::fs::read_to_string(&config_path).map_err(|e| {
            PipelineError::Configuration(format!("read {}: {e}", config_path.display()))
        })?;
        let settings: Settings = serde_yml::from_str(&contents).map_err(|e| {
            PipelineError::Configuration(format!("parse {}: {e}", config_path.display()))
        })?;
        info!("Loaded config from {}", config_path.display());

        let base_dir = config_path
            .parent()
            .map(Path::to_path_buf)
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(cwd);

        Ok((settings, base_dir))
    }
}

/// Contents of `prompt_config.yaml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PromptFile {
    pub system_prompt: String,
    pub user_prompt_template: String,
}

impl PromptFile {
    /// # Errors
    ///
    /// Returns `Configuration` if the file is missing or is not valid YAML.
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::Configuration(format!(
                "prompt config file {}: {e}",
                path.display()
            ))
        })?;
        let prompts = serde_yml::from_str(&contents).map_err(|e| {
            PipelineError::Configuration(format!("parse {}: {e}", path.display()))
        })?;
        info!("Read prompts from {}", path.display());
        Ok(prompts)
    }
}

/// Per-provider connection settings, resolved at startup.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub credential: Option<Credential>,
    pub model_name: String,
    pub endpoint: String,
    pub timeout: Duration,
    pub max_output_tokens: Option<u32>,
}

/// The reference voice sample. Checked once at startup.
#[derive(Debug, Clone)]
pub struct ReferenceSample {
    path: PathBuf,
    size_bytes: u64,
}

impl ReferenceSample {
    /// Opens the file to prove it exists and is readable.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the file is missing, unreadable, not a
    /// regular file, or empty.
    pub fn open(path: &Path) -> Result<Self, PipelineError> {
        let file = File::open(path).map_err(|e| {
            PipelineError::Configuration(format!(
                "reference audio sample {}: {e}",
                path.display()
            ))
        })?;
        let metadata = file.metadata().map_err(|e| {
            PipelineError::Configuration(format!(
                "reference audio sample {}: {e}",
                path.display()
            ))
        })?;
        if !metadata.is_file() || metadata.len() == 0 {
            return Err(PipelineError::Configuration(format!(
                "reference audio sample {} is not a non-empty file",
                path.display()
            )));
        }
        let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        info!(
            "Using reference audio sample {} ({} bytes)",
            path.display(),
            metadata.len()
        );
        Ok(Self {
            path,
            size_bytes: metadata.len(),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind: String,
    pub prompt: PromptTemplate,
    pub extractor: ExtractorSettings,
    pub gemini: ProviderConfig,
    pub openrouter: ProviderConfig,
    pub openrouter_referer: Option<String>,
    pub openrouter_title: String,
    pub tts: TtsSettings,
    pub reference_sample: ReferenceSample,
}

impl AppConfig {
    /// Loads settings and every file they point at.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` for anything that makes the service unable to
    /// start: unreadable config, prompt template without the text marker,
    /// missing reference audio sample.
    pub fn load(path: Option<&Path>) -> Result<Self, PipelineError> {
        let (settings, base_dir) = Settings::load(path)?;
        Self::from_settings(settings, &base_dir)
    }

    /// # Errors
    ///
    /// See [`AppConfig::load`].
    pub fn from_settings(settings: Settings, base_dir: &Path) -> Result<Self, PipelineError> {
        let prompt_file = PromptFile::load(&resolve(base_dir, &settings.prompts.path))?;
        let prompt = PromptTemplate::new(
            prompt_file.system_prompt,
            prompt_file.user_prompt_template,
        )?;

        let mut tts = settings.tts;
        tts.ref_audio_path = resolve(base_dir, &tts.ref_audio_path);
        let reference_sample = ReferenceSample::open(&tts.ref_audio_path)?;

        let gemini_settings = settings.providers.gemini;
        let gemini = ProviderConfig {
            credential: load_credential(
                "gemini",
                &gemini_settings.api_key_env,
                gemini_settings.api_key_file.as_deref(),
                base_dir,
            ),
            model_name: gemini_settings.model,
            endpoint: gemini_settings.endpoint,
            timeout: Duration::from_secs(gemini_settings.timeout_secs),
            max_output_tokens: gemini_settings.max_output_tokens,
        };

        let openrouter_settings = settings.providers.openrouter;
        let openrouter = ProviderConfig {
            credential: load_credential(
                "openrouter",
                &openrouter_settings.api_key_env,
                openrouter_settings.api_key_file.as_deref(),
                base_dir,
            ),
            model_name: openrouter_settings.model,
            endpoint: openrouter_settings.endpoint,
            timeout: Duration::from_secs(openrouter_settings.timeout_secs),
            max_output_tokens: openrouter_settings.max_output_tokens,
        };

        Ok(Self {
            bind: settings.server.bind,
            prompt,
            extractor: settings.extractor,
            gemini,
            openrouter,
            openrouter_referer: openrouter_settings.referer,
            openrouter_title: openrouter_settings.title,
            tts,
            reference_sample,
        })
    }
}

fn resolve(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

/// Environment variable first, then the key file. A missing credential is
/// not fatal here; the provider reports it when it is first used.
fn load_credential(
    provider: &str,
    env_var: &str,
    key_file: Option<&Path>,
    base_dir: &Path,
) -> Option<Credential> {
    if !env_var.is_empty()
        && let Some(credential) = std::env::var(env_var).ok().and_then(Credential::new)
    {
        info!("Read API key for {} from ${}", provider, env_var);
        return Some(credential);
    }

    let path = resolve(base_dir, key_file?);
    match std::fs::read_to_string(&path) {
        Ok(contents) => {
            let credential = Credential::new(contents);
            if credential.is_some() {
                info!("Read API key for {} from {}", provider, path.display());
            } else {
                warn!("API key file for {} is empty: {}", provider, path.display());
            }
            credential
        }
        Err(e) => {
            warn!(
                "No API key for {} ({}: {e}); requests to it will fail",
                provider,
                path.display()
            );
            None
        }
    }
}
