use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    Quit,
    Section,
    Catchup,
    AbortCatchup,
    StopNode,
    Help,
    Forward,
    Back,
    Up,
    Down,
    Yes,
    No,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyPattern {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyPattern {
    const fn plain(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::NONE,
        }
    }

    const fn ctrl(c: char) -> Self {
        Self {
            code: KeyCode::Char(c),
            modifiers: KeyModifiers::CONTROL,
        }
    }

    /// Shift is ignored so that `?` matches however the terminal reports it.
    #[must_use]
    pub fn matches(&self, key: &KeyEvent) -> bool {
        self.code == key.code && key.modifiers.difference(KeyModifiers::SHIFT) == self.modifiers
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Binding {
    pub action: Action,
    pub keys: &'static [KeyPattern],
    pub help_key: &'static str,
    pub help: &'static str,
}

const QUIT: Binding = Binding {
    action: Action::Quit,
    keys: &[KeyPattern::plain(KeyCode::Char('q')), KeyPattern::ctrl('c')],
    help_key: "q",
    help: "quit",
};

const FORWARD: Binding = Binding {
    action: Action::Forward,
    keys: &[
        KeyPattern::plain(KeyCode::Enter),
        KeyPattern::plain(KeyCode::Right),
    ],
    help_key: "enter",
    help: "forwards",
};

const BACK: Binding = Binding {
    action: Action::Back,
    keys: &[
        KeyPattern::plain(KeyCode::Esc),
        KeyPattern::plain(KeyCode::Left),
    ],
    help_key: "esc",
    help: "backwards",
};

const UP: Binding = Binding {
    action: Action::Up,
    keys: &[
        KeyPattern::plain(KeyCode::Up),
        KeyPattern::plain(KeyCode::Char('k')),
    ],
    help_key: "↑",
    help: "up",
};

const DOWN: Binding = Binding {
    action: Action::Down,
    keys: &[
        KeyPattern::plain(KeyCode::Down),
        KeyPattern::plain(KeyCode::Char('j')),
    ],
    help_key: "↓",
    help: "down",
};

pub static APP_KEYS: &[Binding] = &[
    Binding {
        action: Action::Section,
        keys: &[KeyPattern::plain(KeyCode::Tab)],
        help_key: "tab",
        help: "section",
    },
    FORWARD,
    BACK,
    UP,
    DOWN,
    Binding {
        action: Action::Catchup,
        keys: &[KeyPattern::plain(KeyCode::Char('f'))],
        help_key: "f",
        help: "start fast catchup",
    },
    Binding {
        action: Action::AbortCatchup,
        keys: &[KeyPattern::plain(KeyCode::Char('a'))],
        help_key: "a",
        help: "abort catchup",
    },
    Binding {
        action: Action::StopNode,
        keys: &[KeyPattern::plain(KeyCode::Char('s'))],
        help_key: "s",
        help: "stop node",
    },
    QUIT,
    Binding {
        action: Action::Help,
        keys: &[KeyPattern::plain(KeyCode::Char('?'))],
        help_key: "?",
        help: "help",
    },
];

pub static INSTALLER_KEYS: &[Binding] = &[
    UP,
    DOWN,
    FORWARD,
    BACK,
    Binding {
        action: Action::Yes,
        keys: &[KeyPattern::plain(KeyCode::Char('y'))],
        help_key: "y",
        help: "yes",
    },
    Binding {
        action: Action::No,
        keys: &[KeyPattern::plain(KeyCode::Char('n'))],
        help_key: "n",
        help: "no",
    },
    QUIT,
];

/// Resolve a key press to the first enabled action bound to it.
pub fn lookup(
    table: &[Binding],
    key: &KeyEvent,
    enabled: impl Fn(Action) -> bool,
) -> Option<Action> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    table
        .iter()
        .filter(|binding| enabled(binding.action))
        .find(|binding| binding.keys.iter().any(|pattern| pattern.matches(key)))
        .map(|binding| binding.action)
}

/// `(key, description)` pairs for the enabled bindings, in table order.
pub fn help_entries(
    table: &[Binding],
    enabled: impl Fn(Action) -> bool,
) -> Vec<(&'static str, &'static str)> {
    table
        .iter()
        .filter(|binding| enabled(binding.action))
        .map(|binding| (binding.help_key, binding.help))
        .collect()
}
