use serde::Deserialize;
use std::error::Error;
use std::fmt;
use std::fs;
use std::path::Path;
use log::info;

use crate::models::chat::Turn;

pub const SYSTEM_ACKNOWLEDGEMENT: &str =
    "Understood. I will assist visitors with information about the portfolio.";
pub const BIOGRAPHY_ACKNOWLEDGEMENT: &str =
    "I have noted the portfolio information and will use it to answer questions.";
pub const BIOGRAPHY_PREFIX: &str = "Here is the context about the portfolio owner:\n";

pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful AI assistant for a portfolio website. \n\
You help visitors learn about the portfolio owner's skills, projects, and experience.\n\
Be friendly, professional, and concise in your responses.";

pub const DEFAULT_BIOGRAPHY: &str =
    "\nPortfolio Owner Information:\n\
- Name: [Your Name]\n\
- Role: Full-stack Developer\n\
- Skills: TypeScript, React, Node.js, Python\n\
- Experience: [Add your experience details]\n\
- Projects: [Add your project details]\n\
- Education: [Add your education details]\n\
- Contact: [Add your contact information]\n\
\n\
Please customize this section with actual portfolio information.\n";

#[derive(Debug)]
pub enum ContextError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Empty(&'static str),
}

impl fmt::Display for ContextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextError::Io(e) => write!(f, "Context file IO error: {}", e),
            ContextError::Json(e) => write!(f, "Context JSON parsing error: {}", e),
            ContextError::Empty(field) => write!(f, "Context field '{}' must not be empty", field),
        }
    }
}

impl Error for ContextError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ContextError::Io(e) => Some(e),
            ContextError::Json(e) => Some(e),
            ContextError::Empty(_) => None,
        }
    }
}

impl From<std::io::Error> for ContextError {
    fn from(err: std::io::Error) -> Self {
        ContextError::Io(err)
    }
}

impl From<serde_json::Error> for ContextError {
    fn from(err: serde_json::Error) -> Self {
        ContextError::Json(err)
    }
}

/// Fixed preamble placed in front of every conversation. Built once at startup.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ConversationContext {
    pub system_prompt: String,
    pub biography: String,
}

impl Default for ConversationContext {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            biography: DEFAULT_BIOGRAPHY.to_string(),
        }
    }
}

impl ConversationContext {
    pub fn new(system_prompt: impl Into<String>, biography: impl Into<String>) -> Self {
        Self { system_prompt: system_prompt.into(), biography: biography.into() }
    }

    /// The four synthetic leading turns: instructions, acknowledgement, biography,
    /// acknowledgement.
    pub fn preamble(&self) -> Vec<Turn> {
        vec![
            Turn::user(self.system_prompt.clone()),
            Turn::assistant(SYSTEM_ACKNOWLEDGEMENT),
            Turn::user(format!("{}{}", BIOGRAPHY_PREFIX, self.biography)),
            Turn::assistant(BIOGRAPHY_ACKNOWLEDGEMENT)
        ]
    }

    fn validate(&self) -> Result<(), ContextError> {
        if self.system_prompt.trim().is_empty() {
            return Err(ContextError::Empty("system_prompt"));
        }
        if self.biography.trim().is_empty() {
            return Err(ContextError::Empty("biography"));
        }
        Ok(())
    }
}

/// Reads a context override file. Fields left out of the file keep their defaults.
pub fn load_context<P: AsRef<Path>>(path: P) -> Result<ConversationContext, ContextError> {
    let file_content = fs::read_to_string(&path)?;
    let context: ConversationContext = serde_json::from_str(&file_content)?;
    context.validate()?;
    info!("Loaded conversation context from {}", path.as_ref().display());
    Ok(context)
}
