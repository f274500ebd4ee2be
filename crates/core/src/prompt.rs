use crate::error::AssemblyError;
use crate::models::SessionContext;

pub const DEFAULT_ASSISTANT_NAME: &str = "PDF Chat Assistant";

#[derive(Debug, Clone)]
pub struct PromptTemplate {
    pub assistant_name: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_ASSISTANT_NAME)
    }
}

impl PromptTemplate {
    pub fn new(assistant_name: impl Into<String>) -> Self {
        Self {
            assistant_name: assistant_name.into(),
        }
    }

    /// Renders the single prompt sent to the model. Context and question are inserted verbatim.
    pub fn build_prompt(
        &self,
        context: Option<&SessionContext>,
        question: &str,
    ) -> Result<String, AssemblyError> {
        let context = context.ok_or(AssemblyError::NoDocument)?;

        Ok(format!(
            "You are an assistant. Your name is \"{name}\". The following is the content of a PDF:\n\n\
             {context}\n\n\
             Based on this content, answer the question:\n\
             {question}\n",
            name = self.assistant_name,
            context = context.as_str(),
            question = question,
        ))
    }
}
