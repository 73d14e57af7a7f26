use super::action::Action;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OnActivate {
    /// Dismiss the launcher.
    Close,
    /// Replace the launcher query with this text.
    Fill(String),
    Run(Action),
}

/// One row of the result list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultItem {
    pub name: String,
    pub description: String,
    pub on_activate: OnActivate,
}

impl ResultItem {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            on_activate: OnActivate::Close,
        }
    }

    pub fn fill(mut self, text: impl Into<String>) -> Self {
        self.on_activate = OnActivate::Fill(text.into());
        self
    }

    pub fn run(mut self, action: Action) -> Self {
        self.on_activate = OnActivate::Run(action);
        self
    }

    /// Text offered on tab completion.
    pub fn completion(&self) -> Option<&str> {
        match &self.on_activate {
            OnActivate::Fill(text) => Some(text),
            _ => None,
        }
    }
}
