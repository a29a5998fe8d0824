use crate::keymap::Action;
use crate::{Command, Event, Theme};
use ratatui::{buffer::Buffer, layout::Rect};

/// A piece of the view tree: owns its state, reacts to events and renders
/// itself.
pub trait Component: Send {
    /// Commands to run when the component comes to life.
    fn init(&mut self) -> Vec<Command> {
        Vec::new()
    }

    fn update(&mut self, event: &Event) -> Vec<Command>;

    fn render(&self, area: Rect, buf: &mut Buffer, theme: &Theme);

    /// Whether `action` does something in the current state.
    fn handles(&self, _action: Action) -> bool {
        false
    }
}

/// Ordered children with one active child. Key input goes to the active
/// child only; every other event reaches all children so that sizes and
/// shared results stay consistent.
pub struct Composite<K> {
    children: Vec<(K, Box<dyn Component>)>,
    active: usize,
}

impl<K: Copy + PartialEq> Composite<K> {
    #[must_use]
    pub fn new(children: Vec<(K, Box<dyn Component>)>) -> Self {
        Self {
            children,
            active: 0,
        }
    }

    #[must_use]
    pub fn active(&self) -> Option<K> {
        self.children.get(self.active).map(|(key, _)| *key)
    }

    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.children.iter().map(|(key, _)| *key)
    }

    /// Make `key` the active child. Returns false if there is no such child.
    pub fn select(&mut self, key: K) -> bool {
        match self.children.iter().position(|(k, _)| *k == key) {
            Some(index) => {
                self.active = index;
                true
            }
            None => false,
        }
    }

    /// Advance to the next child, wrapping around.
    pub fn next(&mut self) {
        if !self.children.is_empty() {
            self.active = (self.active + 1) % self.children.len();
        }
    }

    pub fn init(&mut self) -> Vec<Command> {
        self.children
            .iter_mut()
            .flat_map(|(_, child)| child.init())
            .collect()
    }

    pub fn update(&mut self, event: &Event) -> Vec<Command> {
        match event {
            Event::Key(_) => self
                .children
                .get_mut(self.active)
                .map(|(_, child)| child.update(event))
                .unwrap_or_default(),
            _ => self
                .children
                .iter_mut()
                .flat_map(|(_, child)| child.update(event))
                .collect(),
        }
    }

    pub fn render_active(&self, area: Rect, buf: &mut Buffer, theme: &Theme) {
        if let Some((_, child)) = self.children.get(self.active) {
            child.render(area, buf, theme);
        }
    }

    #[must_use]
    pub fn active_handles(&self, action: Action) -> bool {
        self.children
            .get(self.active)
            .is_some_and(|(_, child)| child.handles(action))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counter {
        keys: Arc<AtomicUsize>,
        others: Arc<AtomicUsize>,
    }

    impl Component for Counter {
        fn update(&mut self, event: &Event) -> Vec<Command> {
            match event {
                Event::Key(_) => self.keys.fetch_add(1, Ordering::SeqCst),
                _ => self.others.fetch_add(1, Ordering::SeqCst),
            };
            Vec::new()
        }

        fn render(&self, _area: Rect, _buf: &mut Buffer, _theme: &Theme) {}
    }

    #[test]
    fn test_keys_go_to_active_child_and_the_rest_is_broadcast() {
        let counters: Vec<_> = (0..3)
            .map(|_| (Arc::new(AtomicUsize::new(0)), Arc::new(AtomicUsize::new(0))))
            .collect();
        let children = counters
            .iter()
            .enumerate()
            .map(|(i, (keys, others))| {
                let child: Box<dyn Component> = Box::new(Counter {
                    keys: Arc::clone(keys),
                    others: Arc::clone(others),
                });
                (i, child)
            })
            .collect();
        let mut composite = Composite::new(children);

        assert!(composite.select(1));
        composite.update(&Event::Key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE)));
        composite.update(&Event::Resize {
            width: 80,
            height: 24,
        });

        let keys: Vec<_> = counters
            .iter()
            .map(|(k, _)| k.load(Ordering::SeqCst))
            .collect();
        let others: Vec<_> = counters
            .iter()
            .map(|(_, o)| o.load(Ordering::SeqCst))
            .collect();
        assert_eq!(keys, vec![0, 1, 0]);
        assert_eq!(others, vec![1, 1, 1]);
    }

    #[test]
    fn test_next_wraps() {
        let children: Vec<(u8, Box<dyn Component>)> = (0..2u8)
            .map(|i| {
                let child: Box<dyn Component> = Box::new(Counter {
                    keys: Arc::default(),
                    others: Arc::default(),
                });
                (i, child)
            })
            .collect();
        let mut composite = Composite::new(children);
        assert_eq!(composite.active(), Some(0));
        composite.next();
        composite.next();
        assert_eq!(composite.active(), Some(0));
        assert!(!composite.select(9));
    }
}
