use crate::component::Component;
use crate::keymap::{self, Action, INSTALLER_KEYS};
use crate::widgets::{ConfirmDialog, help_line, panel_block, spinner_char};
use crate::{Command, Event, InstallUpdate, Outcome, Theme};
use nodeui_install::{
    InstallationTarget, NetworkEntry, ProvisionState, Provisioner, Provisioning, scan_networks,
};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Style, Stylize},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};

pub const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Pause between the script finishing and connecting, so algod can start.
pub const READY_DELAY: Duration = Duration::from_secs(3);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InstallerPhase {
    NetworkSelect,
    Confirm,
    Installing,
}

/// Wizard shown when no node is configured: pick a network, confirm,
/// then follow the update script until the node is up.
pub struct Installer {
    root: Option<PathBuf>,
    script: Option<String>,
    networks: Vec<NetworkEntry>,
    selected: usize,
    phase: InstallerPhase,
    target: Option<InstallationTarget>,
    provisioning: Option<Provisioning>,
    output: String,
    finished: bool,
    tick: usize,
}

impl Default for Installer {
    fn default() -> Self {
        Self::new()
    }
}

impl Installer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: None,
            script: None,
            networks: Vec::new(),
            selected: 0,
            phase: InstallerPhase::NetworkSelect,
            target: None,
            provisioning: None,
            output: String::new(),
            finished: false,
            tick: 0,
        }
    }

    /// Run `script` instead of the bundled update script.
    #[must_use]
    pub fn with_script(mut self, script: impl Into<String>) -> Self {
        self.script = Some(script.into());
        self
    }

    #[must_use]
    pub fn phase(&self) -> InstallerPhase {
        self.phase
    }

    #[must_use]
    pub fn target(&self) -> Option<&InstallationTarget> {
        self.target.as_ref()
    }

    #[must_use]
    pub fn networks(&self) -> &[NetworkEntry] {
        &self.networks
    }

    fn enabled(&self, action: Action) -> bool {
        match (self.phase, action) {
            (_, Action::Quit) => true,
            (InstallerPhase::NetworkSelect, Action::Up | Action::Down | Action::Forward) => {
                self.root.is_some() && !self.networks.is_empty()
            }
            (InstallerPhase::Confirm, Action::Back | Action::Yes | Action::No) => true,
            _ => false,
        }
    }

    fn provisioner(&self, root: PathBuf) -> Provisioner {
        let provisioner = Provisioner::new(root);
        match &self.script {
            Some(script) => provisioner.with_script(script.clone()),
            None => provisioner,
        }
    }

    fn on_action(&mut self, action: Action) -> Vec<Command> {
        match (self.phase, action) {
            (_, Action::Quit) | (InstallerPhase::Confirm, Action::No) => vec![Command::quit()],
            (InstallerPhase::NetworkSelect, Action::Up) => {
                self.selected = self.selected.saturating_sub(1);
                Vec::new()
            }
            (InstallerPhase::NetworkSelect, Action::Down) => {
                if self.selected + 1 < self.networks.len() {
                    self.selected += 1;
                }
                Vec::new()
            }
            (InstallerPhase::NetworkSelect, Action::Forward) => {
                if let (Some(root), Some(entry)) = (&self.root, self.networks.get(self.selected)) {
                    self.target = Some(InstallationTarget::for_entry(root, entry));
                    self.phase = InstallerPhase::Confirm;
                }
                Vec::new()
            }
            (InstallerPhase::Confirm, Action::Back) => {
                self.target = None;
                self.phase = InstallerPhase::NetworkSelect;
                Vec::new()
            }
            (InstallerPhase::Confirm, Action::Yes) => self.launch(),
            _ => Vec::new(),
        }
    }

    fn launch(&mut self) -> Vec<Command> {
        let (Some(root), Some(target)) = (self.root.clone(), self.target.clone()) else {
            return Vec::new();
        };
        self.phase = InstallerPhase::Installing;
        info!(network = %target.network, "Starting installation");

        let provisioner = self.provisioner(root);
        vec![Command::perform("provision", async move {
            let started = provisioner
                .launch(&target)
                .await
                .map_err(|e| e.to_string());
            Outcome::Install(InstallUpdate::Started(started)).into()
        })]
    }

    fn poll(&self) -> Vec<Command> {
        let Some(provisioning) = self.provisioning.clone() else {
            return Vec::new();
        };
        vec![Command::delayed("provision progress", POLL_INTERVAL, async move {
            Outcome::Install(InstallUpdate::Progress(provisioning.snapshot())).into()
        })]
    }

    fn on_install(&mut self, update: &InstallUpdate) -> Vec<Command> {
        if self.phase != InstallerPhase::Installing || self.finished {
            return Vec::new();
        }

        match update {
            InstallUpdate::Started(Ok(provisioning)) => {
                self.provisioning = Some(provisioning.clone());
                self.poll()
            }
            InstallUpdate::Started(Err(e)) => {
                error!("Installation could not start: {e}");
                vec![Command::fail(format!("Installation failed: {e}"))]
            }
            InstallUpdate::Progress(state) => {
                self.output = state.output().to_string();
                match state {
                    ProvisionState::Running { .. } => self.poll(),
                    ProvisionState::Finished { dirs, .. } => {
                        self.finished = true;
                        info!("Node installed in {}", dirs.data_dir.display());
                        vec![Command::emit(
                            "data dir ready",
                            READY_DELAY,
                            Outcome::DataDirReady(dirs.clone()).into(),
                        )]
                    }
                    ProvisionState::Failed { message, .. } => {
                        error!("Installation failed: {message}");
                        vec![Command::fail(format!("Installation failed: {message}"))]
                    }
                }
            }
        }
    }

    fn help(&self, area: Rect, buf: &mut Buffer, theme: &Theme) {
        let entries = keymap::help_entries(INSTALLER_KEYS, |a| self.enabled(a));
        help_line(theme, &entries).render(area, buf);
    }

    fn render_select(&self, area: Rect, buf: &mut Buffer, theme: &Theme) {
        let mut lines = vec![
            Line::from("No node is configured. Pick a network to install."),
            Line::raw(""),
        ];

        let Some(root) = &self.root else {
            lines.push(Line::from(Span::styled(
                format!("{} Preparing configuration directory", spinner_char(self.tick)),
                Style::default().fg(theme.dim),
            )));
            Paragraph::new(lines).render(area, buf);
            return;
        };

        for (i, entry) in self.networks.iter().enumerate() {
            let marker = if i == self.selected { "> " } else { "  " };
            let name_style = if i == self.selected {
                Style::default().fg(theme.primary).bold()
            } else {
                Style::default().fg(theme.fg)
            };
            let mut spans = vec![
                Span::styled(format!("{marker}{:<10}", entry.name), name_style),
                Span::styled(entry.description, Style::default().fg(theme.dim)),
            ];
            if entry.present {
                spans.push(Span::styled(
                    "  (installed)",
                    Style::default().fg(theme.success),
                ));
            }
            lines.push(Line::from(spans));
        }

        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled(
            format!("Installations live in {}", root.display()),
            Style::default().fg(theme.dim),
        )));
        Paragraph::new(lines).render(area, buf);
    }

    fn render_confirm(&self, area: Rect, buf: &mut Buffer, theme: &Theme) {
        let Some(target) = &self.target else {
            return;
        };
        let mut lines = vec![
            Line::from(format!("Install a {} node?", target.network)),
            Line::raw(""),
            Line::from(format!("Binaries: {}", target.bin_dir.display())),
            Line::from(format!("Data:     {}", target.data_dir.display())),
        ];
        if target.present {
            lines.push(Line::raw(""));
            lines.push(Line::from(Span::styled(
                "An existing installation will be updated.",
                Style::default().fg(theme.warning),
            )));
        }
        ConfirmDialog {
            title: "Confirm installation",
            lines,
            theme,
        }
        .render(area, buf);
    }

    fn render_installing(&self, area: Rect, buf: &mut Buffer, theme: &Theme) {
        let network = self.target.as_ref().map_or("", |t| t.network.as_str());
        let mut status = Vec::new();
        if self.finished {
            status.push(Line::from(Span::styled(
                format!("{network} node installed, waiting for it to start"),
                Style::default().fg(theme.success).bold(),
            )));
            if let Some(target) = &self.target {
                status.push(Line::from(Span::styled(
                    format!("Stop it later with: {}", target.stop_hint()),
                    Style::default().fg(theme.dim),
                )));
            }
        } else {
            status.push(Line::from(Span::styled(
                format!("{} Installing {network} node", spinner_char(self.tick)),
                Style::default().fg(theme.primary).bold(),
            )));
        }
        let [status_area, log_area] =
            Layout::vertical([Constraint::Length(3), Constraint::Min(0)]).areas(area);

        Paragraph::new(status)
            .wrap(Wrap { trim: true })
            .render(status_area, buf);

        let visible = usize::from(log_area.height);
        let lines: Vec<&str> = self.output.lines().collect();
        let tail = lines[lines.len().saturating_sub(visible)..].join("\n");
        Paragraph::new(tail)
            .style(Style::default().fg(theme.dim))
            .wrap(Wrap { trim: false })
            .render(log_area, buf);
    }
}

impl Component for Installer {
    fn update(&mut self, event: &Event) -> Vec<Command> {
        match event {
            Event::Key(key) => match keymap::lookup(INSTALLER_KEYS, key, |a| self.enabled(a)) {
                Some(action) => self.on_action(action),
                None => Vec::new(),
            },
            Event::Tick => {
                self.tick = self.tick.wrapping_add(1);
                Vec::new()
            }
            Event::Outcome(Outcome::ConfigDir(Ok(root))) => {
                self.root = Some(root.clone());
                let root = root.clone();
                vec![Command::perform("scan networks", async move {
                    Outcome::NetworksScanned(scan_networks(&root)).into()
                })]
            }
            Event::Outcome(Outcome::NetworksScanned(networks)) => {
                self.networks = networks.clone();
                self.selected = self.selected.min(self.networks.len().saturating_sub(1));
                Vec::new()
            }
            Event::Outcome(Outcome::Install(update)) => self.on_install(update),
            Event::Resize { .. } | Event::Outcome(_) => Vec::new(),
        }
    }

    fn render(&self, area: Rect, buf: &mut Buffer, theme: &Theme) {
        let block = panel_block(theme, " Install a node ");
        let inner = block.inner(area);
        block.render(area, buf);

        let [body, help] =
            Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(inner);
        match self.phase {
            InstallerPhase::NetworkSelect => self.render_select(body, buf, theme),
            InstallerPhase::Confirm => self.render_confirm(body, buf, theme),
            InstallerPhase::Installing => self.render_installing(body, buf, theme),
        }
        self.help(help, buf, theme);
    }

    fn handles(&self, action: Action) -> bool {
        self.enabled(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Exit;
    use crate::testing::{buffer_text, key, resolve};
    use crossterm::event::KeyCode;
    use std::path::Path;

    async fn ready(root: &Path) -> Installer {
        let mut installer = Installer::new();
        let mut commands =
            installer.update(&Outcome::ConfigDir(Ok(root.to_path_buf())).into());
        assert_eq!(commands.len(), 1);
        let event = resolve(commands.remove(0)).await;
        installer.update(&event);
        installer
    }

    #[tokio::test]
    async fn test_config_dir_triggers_network_scan() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join("testnet")).unwrap();
        let installer = ready(root.path()).await;

        let present: Vec<_> = installer
            .networks()
            .iter()
            .map(|n| (n.name, n.present))
            .collect();
        assert_eq!(
            present,
            vec![("mainnet", false), ("testnet", true), ("betanet", false)]
        );
        let text = buffer_text(&installer, 80, 14);
        assert!(text.contains("(installed)"));
    }

    #[tokio::test]
    async fn test_select_confirm_and_back() {
        let root = tempfile::tempdir().unwrap();
        let mut installer = ready(root.path()).await;

        installer.update(&key(KeyCode::Down));
        installer.update(&key(KeyCode::Enter));
        assert_eq!(installer.phase(), InstallerPhase::Confirm);
        let target = installer.target().unwrap();
        assert_eq!(target.network, "testnet");
        assert_eq!(target.data_dir, root.path().join("testnet").join("algod_data"));
        assert!(buffer_text(&installer, 80, 20).contains("Install a testnet node?"));

        installer.update(&key(KeyCode::Esc));
        assert_eq!(installer.phase(), InstallerPhase::NetworkSelect);
        assert!(installer.target().is_none());

        installer.update(&key(KeyCode::Enter));
        let commands = installer.update(&key(KeyCode::Char('n')));
        assert!(matches!(commands.as_slice(), [Command::Quit(Exit::Requested)]));
    }

    #[test]
    fn test_keys_before_config_dir_do_nothing() {
        let mut installer = Installer::new();
        assert!(installer.update(&key(KeyCode::Enter)).is_empty());
        assert_eq!(installer.phase(), InstallerPhase::NetworkSelect);
        assert!(buffer_text(&installer, 80, 10).contains("Preparing configuration directory"));
    }

    #[tokio::test]
    async fn test_every_phase_answers_every_event() {
        let root = tempfile::tempdir().unwrap();
        let mut installer = ready(root.path()).await;

        let events = || {
            vec![
                key(KeyCode::Up),
                key(KeyCode::Char('x')),
                Event::Resize {
                    width: 100,
                    height: 30,
                },
                Event::Tick,
                Outcome::Install(InstallUpdate::Progress(ProvisionState::Running {
                    output: "stray".into(),
                }))
                .into(),
                Outcome::Status(Err("unrelated".into())).into(),
                Outcome::NetworksScanned(scan_networks(root.path())).into(),
            ]
        };

        for phase in [InstallerPhase::NetworkSelect, InstallerPhase::Confirm] {
            for event in events() {
                assert!(installer.update(&event).is_empty());
                assert_eq!(installer.phase(), phase);
            }
            installer.update(&key(KeyCode::Enter));
        }

        installer.phase = InstallerPhase::Installing;
        for event in events() {
            assert!(installer.update(&event).is_empty());
            assert_eq!(installer.phase(), InstallerPhase::Installing);
        }
    }

    async fn confirm_testnet(root: &Path) -> Vec<Command> {
        let mut installer = ready(root).await;
        installer.update(&key(KeyCode::Down));
        installer.update(&key(KeyCode::Enter));

        let mut commands = installer.update(&key(KeyCode::Char('y')));
        assert_eq!(commands.len(), 1);
        let started = resolve(commands.remove(0)).await;
        assert!(matches!(
            &started,
            Event::Outcome(Outcome::Install(InstallUpdate::Started(Err(_))))
        ));
        installer.update(&started)
    }

    #[tokio::test]
    async fn test_directory_failure_is_fatal() {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join("testnet"), "").unwrap();

        let commands = confirm_testnet(root.path()).await;
        assert!(matches!(
            commands.as_slice(),
            [Command::Quit(Exit::Failed(message))]
                if message.starts_with("Installation failed: Failed to create data directory")
        ));
    }

    #[tokio::test]
    async fn test_script_write_failure_is_fatal() {
        let root = tempfile::tempdir().unwrap();
        let script = root.path().join("testnet").join("algod_bin").join("update.sh");
        std::fs::create_dir_all(script).unwrap();

        let commands = confirm_testnet(root.path()).await;
        assert!(matches!(
            commands.as_slice(),
            [Command::Quit(Exit::Failed(message))]
                if message.starts_with("Installation failed: Failed to write")
        ));
    }

    #[cfg(unix)]
    async fn install(script: &str, root: &Path) -> (Installer, Vec<Command>) {
        let mut installer = ready(root).await;
        installer.script = Some(script.to_string());
        installer.update(&key(KeyCode::Down));
        installer.update(&key(KeyCode::Enter));

        let mut commands = installer.update(&key(KeyCode::Char('y')));
        assert_eq!(installer.phase(), InstallerPhase::Installing);
        assert_eq!(commands.len(), 1);

        let event = resolve(commands.remove(0)).await;
        let mut commands = installer.update(&event);
        loop {
            assert_eq!(commands.len(), 1);
            if !matches!(commands[0], Command::Task { label: "provision progress", .. }) {
                return (installer, commands);
            }
            assert_eq!(commands[0].delay(), POLL_INTERVAL);
            let event = commands.remove(0).run().await.unwrap();
            commands = installer.update(&event);
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_installation_happy_path() {
        let root = tempfile::tempdir().unwrap();
        let script = "#!/bin/sh\necho \"installing $8\"\n";
        let (installer, mut commands) = install(script, root.path()).await;

        assert_eq!(commands[0].delay(), READY_DELAY);
        let event = resolve(commands.remove(0)).await;
        let Event::Outcome(Outcome::DataDirReady(dirs)) = event else {
            panic!("expected data dir, got {event:?}");
        };
        let base = root.path().join("testnet");
        assert_eq!(dirs.data_dir, base.join("algod_data"));
        assert_eq!(dirs.bin_dir, base.join("algod_bin"));
        assert!(base.join("algod_bin").join("update.sh").is_file());

        let text = buffer_text(&installer, 80, 12);
        assert!(text.contains("installing testnet"));
        assert!(text.contains("testnet node installed"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_installation_failure_is_fatal() {
        let root = tempfile::tempdir().unwrap();
        let script = "#!/bin/sh\necho nope >&2\nexit 3\n";
        let (_installer, commands) = install(script, root.path()).await;

        assert!(matches!(
            commands.as_slice(),
            [Command::Quit(Exit::Failed(message))] if message.starts_with("Installation failed")
        ));
    }
}
