use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use once_cell::sync::Lazy;

pub const API_KEY_ENV: &str = "SCW_SECRET_KEY";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub log_format: LogFormat,
    pub log_dir: Option<PathBuf>,
    pub port: u16,
    pub api_key: Option<String>,
    pub api_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub upstream_timeout_seconds: u64,
    /// Problems found while loading, logged once logging is up.
    pub warnings: Vec<String>,
}

pub static CONFIG: Lazy<Config> =
    Lazy::new(|| Config::load().expect("Failed to load configuration"));

fn env_string(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_optional(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_f32(name: &str, default: f32) -> f32 {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<f32>().ok())
        .filter(|value| value.is_finite())
        .unwrap_or(default)
}

fn env_u16(name: &str, default: u16) -> u16 {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<u16>().ok())
        .unwrap_or(default)
}

fn env_u32(name: &str, default: u32) -> u32 {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<u32>().ok())
        .unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn parse_log_format(value: &str) -> Result<LogFormat, String> {
    match value.trim().to_lowercase().as_str() {
        "json" => Ok(LogFormat::Json),
        "text" | "" => Ok(LogFormat::Text),
        other => Err(format!(
            "Unknown LOG_FORMAT value '{other}'; defaulting to text."
        )),
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let api_url = env_string(
            "CRITIQUE_API_URL",
            "https://api.scaleway.ai/v1/chat/completions",
        )
        .trim()
        .to_string();
        if api_url.is_empty() {
            return Err(anyhow!("CRITIQUE_API_URL must not be empty"));
        }

        let model = env_string("CRITIQUE_MODEL", "pixtral-12b-2409")
            .trim()
            .to_string();
        if model.is_empty() {
            return Err(anyhow!("CRITIQUE_MODEL must not be empty"));
        }

        let mut warnings = Vec::new();
        let log_format = parse_log_format(&env_string("LOG_FORMAT", "text")).unwrap_or_else(
            |warning| {
                warnings.push(warning);
                LogFormat::Text
            },
        );

        Ok(Config {
            log_level: env_string("LOG_LEVEL", "info").to_lowercase(),
            log_format,
            log_dir: env_optional("LOG_DIR").map(PathBuf::from),
            port: env_u16("PORT", 8080),
            api_key: env_optional(API_KEY_ENV),
            api_url,
            model,
            temperature: env_f32("CRITIQUE_TEMPERATURE", 0.5),
            max_tokens: env_u32("CRITIQUE_MAX_TOKENS", 1500).max(1),
            upstream_timeout_seconds: env_u64("UPSTREAM_TIMEOUT_SECONDS", 60).max(1),
            warnings,
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

pub const BASE_SYSTEM_PROMPT: &str = r#"You are a Product Design Leader with extensive experience at top-tier tech companies.
You are empathetic but rigorous.
Your role is to deliver clear, high-signal design critique that helps a mid-level designer improve their work.

You will receive:
- An image of a UI design
- A stated User Goal
- An optional Critique Lens
- Optional contextual modifiers

Base your critique strictly on what is visible in the image.
Do not invent requirements or features.

---

ANALYSIS FRAMEWORK — The 4-Point Inspection

Analyze the design using these lenses:

1. Visual Hierarchy & Layout
2. Usability & Accessibility
3. Copywriting & Tone
4. Goal Alignment with the stated User Goal

---

PRIORITIZATION RULES

- Focus on the 2–3 issues that most strongly impact success.
- Avoid generic advice.
- Reference concrete visual elements (buttons, text, placement, contrast).
- Use the Critique Lens to prioritize, adjust tone, and suppress irrelevant feedback.

---

OUTPUT FORMAT (MANDATORY) - Use Rich Markdown

### 🎯 First Impression
(1–2 sentences on the immediate vibe)

### 🔍 The Critical Analysis
- ✅ **What works:** (Bullet points)
- ⚠️ **What needs work:** (Bullet points with specific references)

### 💡 The "10% Improvements"
1. [Actionable Step 1]
2. [Actionable Step 2]
3. [Actionable Step 3]

### ⚖️ Leader’s Verdict
(Short, decisive summary)

------------------------------------------------------------
VISUAL RULES (CRITICAL)
1. **HEADINGS:** You MUST use `###` (three hashes) for all numbered section titles.
2. **HIGHLIGHTS:** Use `<span style="color: #D0BCFF">text</span>` SPARINGLY.
3. **SEVERITY COLORS:**
   - <span style="color: #ef4444; font-weight: bold;">High Severity</span> (Red)
   - <span style="color: #eab308; font-weight: bold;">Medium Severity</span> (Yellow)
   - <span style="color: #22c55e; font-weight: bold;">Strength</span> (Green)
"#;

#[cfg(test)]
pub fn test_config(api_url: &str) -> Config {
    Config {
        log_level: "info".to_string(),
        log_format: LogFormat::Text,
        log_dir: None,
        port: 0,
        api_key: Some("test-key".to_string()),
        api_url: api_url.to_string(),
        model: "pixtral-12b-2409".to_string(),
        temperature: 0.5,
        max_tokens: 1500,
        upstream_timeout_seconds: 5,
        warnings: Vec::new(),
    }
}
