use crate::component::Component;
use crate::keymap::{self, APP_KEYS, Action};
use crate::widgets::panel_block;
use crate::{Command, Event, Outcome, Theme};
use nodeui_client::{ClientError, NodeApi};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    widgets::{Paragraph, Widget},
};
use std::sync::Arc;

const NO_DATA_DIR: &str = "The node configuration is only available when nodeui is started \
with a data directory (-d or ALGORAND_DATA).";

/// Shows the node's `config.json`.
pub struct ConfigPanel {
    api: Arc<dyn NodeApi>,
    contents: Option<Result<String, String>>,
    scroll: u16,
}

impl ConfigPanel {
    #[must_use]
    pub fn new(api: Arc<dyn NodeApi>) -> Self {
        Self {
            api,
            contents: None,
            scroll: 0,
        }
    }
}

impl Component for ConfigPanel {
    fn init(&mut self) -> Vec<Command> {
        let api = Arc::clone(&self.api);
        vec![Command::perform("config file", async move {
            let result = api.config_file().await.map_err(|e| match e {
                ClientError::NoDataDir => NO_DATA_DIR.to_string(),
                other => other.to_string(),
            });
            Outcome::ConfigFile(result).into()
        })]
    }

    fn update(&mut self, event: &Event) -> Vec<Command> {
        match event {
            Event::Outcome(Outcome::ConfigFile(result)) => {
                self.contents = Some(result.clone());
                self.scroll = 0;
            }
            Event::Key(key) => match keymap::lookup(APP_KEYS, key, |a| self.handles(a)) {
                Some(Action::Up) => self.scroll = self.scroll.saturating_sub(1),
                Some(Action::Down) => self.scroll = self.scroll.saturating_add(1),
                _ => {}
            },
            _ => {}
        }
        Vec::new()
    }

    fn render(&self, area: Rect, buf: &mut Buffer, theme: &Theme) {
        let block = panel_block(theme, " config.json ");
        let inner = block.inner(area);
        block.render(area, buf);

        let (text, color) = match &self.contents {
            None => ("Loading…", theme.dim),
            Some(Ok(contents)) => (contents.as_str(), theme.fg),
            Some(Err(e)) => (e.as_str(), theme.warning),
        };
        Paragraph::new(text)
            .style(Style::default().fg(color))
            .scroll((self.scroll, 0))
            .render(inner, buf);
    }

    fn handles(&self, action: Action) -> bool {
        matches!(action, Action::Up | Action::Down) && matches!(self.contents, Some(Ok(_)))
    }
}
