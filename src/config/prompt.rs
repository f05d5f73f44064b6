use serde::Deserialize;
use std::error::Error;
use std::fmt;
use std::fs;
use std::path::Path;
use log::info;

#[derive(Debug)]
pub enum PromptError {
    EmptyField(&'static str),
    IoError(std::io::Error),
    JsonError(serde_json::Error),
}

impl fmt::Display for PromptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromptError::EmptyField(key) => write!(f, "Prompt field '{}' is empty", key),
            PromptError::IoError(e) => write!(f, "Prompt file IO error: {}", e),
            PromptError::JsonError(e) => write!(f, "Prompt JSON parsing error: {}", e),
        }
    }
}

impl Error for PromptError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PromptError::IoError(e) => Some(e),
            PromptError::JsonError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PromptError {
    fn from(err: std::io::Error) -> Self {
        PromptError::IoError(err)
    }
}

impl From<serde_json::Error> for PromptError {
    fn from(err: serde_json::Error) -> Self {
        PromptError::JsonError(err)
    }
}

/// Persona used by the terminal chat.
pub const CLI_SYSTEM_MESSAGE: &str =
    "You are a helpful assistant in company AI Laboratory. And do not tell that your core is ChatGPT.";

/// Persona used by the Telegram bot.
pub const BOT_SYSTEM_MESSAGE: &str =
    "Ты полезный ассистент в компании ИИ Лаборатория. ИИ Лаборатория занимается разработкой ИИ для любых целей. Мы еще начинающая команда, но вскором времени наберем обороты.";

#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptConfig {
    #[serde(default)]
    pub system_message: Option<String>,
    /// `/start` reply; `{mention}` is substituted with a link to the user.
    #[serde(default)]
    pub greeting: Option<String>,
}

impl PromptConfig {
    fn validate(&self) -> Result<(), PromptError> {
        if self.system_message.as_deref().is_some_and(|s| s.trim().is_empty()) {
            return Err(PromptError::EmptyField("system_message"));
        }
        if self.greeting.as_deref().is_some_and(|s| s.trim().is_empty()) {
            return Err(PromptError::EmptyField("greeting"));
        }
        Ok(())
    }
}

pub fn load_prompts<P: AsRef<Path>>(path: P) -> Result<PromptConfig, PromptError> {
    let file_content = fs::read_to_string(&path)?;
    let config: PromptConfig = serde_json::from_str(&file_content)?;
    config.validate()?;
    info!("Loaded prompts from {}", path.as_ref().display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_prompts(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_partial_prompt_file() {
        let file = write_prompts(r#"{ "system_message": "Be brief." }"#);
        let config = load_prompts(file.path()).unwrap();
        assert_eq!(config.system_message.as_deref(), Some("Be brief."));
        assert!(config.greeting.is_none());
    }

    #[test]
    fn rejects_blank_fields() {
        let file = write_prompts(r#"{ "greeting": "   " }"#);
        let err = load_prompts(file.path()).unwrap_err();
        assert!(matches!(err, PromptError::EmptyField("greeting")));
    }

    #[test]
    fn reports_malformed_json() {
        let file = write_prompts("{ not json");
        assert!(matches!(load_prompts(file.path()), Err(PromptError::JsonError(_))));
    }

    #[test]
    fn reports_missing_file() {
        let err = load_prompts("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, PromptError::IoError(_)));
        assert!(err.source().is_some());
    }
}
