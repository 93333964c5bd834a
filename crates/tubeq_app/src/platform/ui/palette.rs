use tubeq_core::{JobStatus, Theme};

const RESET: &str = "\x1b[0m";

/// ANSI colours for one theme. A plain palette emits no escapes.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    enabled: bool,
    theme: Theme,
}

impl Palette {
    pub fn new(theme: Theme, enabled: bool) -> Self {
        Self { enabled, theme }
    }

    #[cfg(test)]
    pub fn plain() -> Self {
        Self::new(Theme::Light, false)
    }

    pub fn heading(&self, text: &str) -> String {
        self.paint(text, "1")
    }

    pub fn muted(&self, text: &str) -> String {
        self.paint(text, "2")
    }

    pub fn error(&self, text: &str) -> String {
        self.paint(text, "1;31")
    }

    pub fn link(&self, text: &str) -> String {
        let code = match self.theme {
            Theme::Light => "4;34",
            Theme::Dark => "4;96",
        };
        self.paint(text, code)
    }

    pub fn status(&self, status: JobStatus, text: &str) -> String {
        let code = match (self.theme, status) {
            (_, JobStatus::Queued) => "2",
            (Theme::Light, JobStatus::Downloading) => "34",
            (Theme::Dark, JobStatus::Downloading) => "94",
            (Theme::Light, JobStatus::Converting) => "35",
            (Theme::Dark, JobStatus::Converting) => "95",
            (Theme::Light, JobStatus::Completed) => "32",
            (Theme::Dark, JobStatus::Completed) => "92",
            (_, JobStatus::Failed) => "31",
        };
        self.paint(text, code)
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if self.enabled {
            format!("\x1b[{code}m{text}{RESET}")
        } else {
            text.to_string()
        }
    }
}
