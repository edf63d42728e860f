//! System-turn templates and the context-mode marker.

/// What the answer is grounded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextMode {
    /// Retrieved sections of the paper's PDF.
    Document,
    /// Only the caller-supplied title and abstract.
    Abstract,
}

impl ContextMode {
    pub fn label(&self) -> &'static str {
        match self {
            ContextMode::Document => "PDF content",
            ContextMode::Abstract => "abstract and title",
        }
    }

    /// First chunk of every successful stream.
    pub fn marker(&self) -> String {
        format!("[Chatting with {}]\n\n", self.label())
    }
}

const PERSONA: &str = "You are the best research paper explainer in the world.";

pub fn document_prompt(title: &str, context: &str) -> String {
    format!(
        "{PERSONA}\n\n\
         Paper Title: {title}\n\n\
         PDF Content (relevant sections):\n{context}\n\n\
         You are chatting with PDF content. Answer based on the PDF content provided above."
    )
}

pub fn abstract_prompt(title: &str, abstract_text: &str) -> String {
    format!(
        "{PERSONA}\n\n\
         Paper Title: {title}\n\
         Paper Abstract: {abstract_text}\n\n\
         You are chatting with abstract and title only (PDF not available). \
         Answer based on the title and abstract provided."
    )
}
