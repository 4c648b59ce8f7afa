//! Scripted page driver and recording notifier for core tests.

use crate::{Config, Error, Notifier, PageDriver, PageElement, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Navigate(String),
    Reload,
    Clear(String),
    Type(String, String),
    Click(String),
    Close,
}

#[derive(Debug, Clone)]
struct Node {
    text: String,
    visible: bool,
}

#[derive(Default)]
struct PageState {
    nodes: HashMap<String, Node>,
    /// Per-lookup states for a selector; the last one sticks
    frames: HashMap<String, VecDeque<Option<String>>>,
    appears_within_wait: HashSet<String>,
    failing_lookups: HashSet<String>,
    failing_navigations: HashSet<String>,
    failing_actions: HashSet<String>,
    reload_fails: bool,
    lookups: HashMap<String, usize>,
    actions: Vec<Action>,
}

/// In-memory page whose contents are scripted by the test
#[derive(Clone, Default)]
pub struct ScriptedPage {
    state: Arc<Mutex<PageState>>,
}

impl ScriptedPage {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state(self, f: impl FnOnce(&mut PageState)) -> Self {
        f(&mut self.state.lock().unwrap());
        self
    }

    /// A visible element with the given text
    pub fn with_element(self, selector: &str, text: &str) -> Self {
        self.with_state(|s| {
            s.nodes.insert(
                selector.to_string(),
                Node {
                    text: text.to_string(),
                    visible: true,
                },
            );
        })
    }

    pub fn with_hidden_element(self, selector: &str) -> Self {
        self.with_state(|s| {
            s.nodes.insert(
                selector.to_string(),
                Node {
                    text: String::new(),
                    visible: false,
                },
            );
        })
    }

    /// Successive lookups of `selector` see these states in order
    pub fn with_frames(self, selector: &str, frames: &[Option<&str>]) -> Self {
        self.with_state(|s| {
            s.frames.insert(
                selector.to_string(),
                frames.iter().map(|f| f.map(str::to_string)).collect(),
            );
        })
    }

    /// `selector` shows up while waiting for presence
    pub fn with_login(self, selector: &str) -> Self {
        self.with_state(|s| {
            s.appears_within_wait.insert(selector.to_string());
        })
    }

    pub fn failing_reload(self) -> Self {
        self.with_state(|s| s.reload_fails = true)
    }

    pub fn failing_navigation(self, url: &str) -> Self {
        self.with_state(|s| {
            s.failing_navigations.insert(url.to_string());
        })
    }

    pub fn failing_lookup(self, selector: &str) -> Self {
        self.with_state(|s| {
            s.failing_lookups.insert(selector.to_string());
        })
    }

    /// Clearing, typing into or clicking `selector` fails
    pub fn failing_action(self, selector: &str) -> Self {
        self.with_state(|s| {
            s.failing_actions.insert(selector.to_string());
        })
    }

    pub fn actions(&self) -> Vec<Action> {
        self.state.lock().unwrap().actions.clone()
    }

    pub fn lookups(&self, selector: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .lookups
            .get(selector)
            .copied()
            .unwrap_or(0)
    }

    pub fn clicks(&self, selector: &str) -> usize {
        self.count(|a| matches!(a, Action::Click(s) if s == selector))
    }

    pub fn closes(&self) -> usize {
        self.count(|a| matches!(a, Action::Close))
    }

    pub fn count(&self, pred: impl Fn(&Action) -> bool) -> usize {
        self.state
            .lock()
            .unwrap()
            .actions
            .iter()
            .filter(|a| pred(a))
            .count()
    }

    fn record(&self, action: Action) {
        self.state.lock().unwrap().actions.push(action);
    }
}

#[async_trait]
impl PageDriver for ScriptedPage {
    type Element = ScriptedElement;

    async fn navigate(&self, url: &str) -> Result<()> {
        self.record(Action::Navigate(url.to_string()));
        if self.state.lock().unwrap().failing_navigations.contains(url) {
            return Err(Error::Driver(format!("navigation to {} failed", url)));
        }
        Ok(())
    }

    async fn reload(&self) -> Result<()> {
        self.record(Action::Reload);
        if self.state.lock().unwrap().reload_fails {
            return Err(Error::Driver("reload failed".to_string()));
        }
        Ok(())
    }

    async fn find_element(&self, selector: &str) -> Result<Option<ScriptedElement>> {
        let mut state = self.state.lock().unwrap();
        *state.lookups.entry(selector.to_string()).or_default() += 1;

        if state.failing_lookups.contains(selector) {
            return Err(Error::Driver(format!("lookup of {} failed", selector)));
        }

        let node = match state.frames.get_mut(selector) {
            Some(frames) => {
                let frame = if frames.len() > 1 {
                    frames.pop_front().flatten()
                } else {
                    frames.front().cloned().flatten()
                };
                frame.map(|text| Node {
                    text,
                    visible: true,
                })
            }
            None => state.nodes.get(selector).cloned(),
        };

        Ok(node.map(|node| ScriptedElement {
            selector: selector.to_string(),
            node,
            page: self.clone(),
        }))
    }

    async fn wait_for_presence(&self, selector: &str, _timeout: Duration) -> Result<bool> {
        let state = self.state.lock().unwrap();
        Ok(state.appears_within_wait.contains(selector) || state.nodes.contains_key(selector))
    }

    async fn close(&mut self) -> Result<()> {
        self.record(Action::Close);
        Ok(())
    }
}

pub struct ScriptedElement {
    selector: String,
    node: Node,
    page: ScriptedPage,
}

impl ScriptedElement {
    fn act(&self, action: Action) -> Result<()> {
        self.page.record(action);
        if self
            .page
            .state
            .lock()
            .unwrap()
            .failing_actions
            .contains(&self.selector)
        {
            return Err(Error::Driver(format!("element {} is detached", self.selector)));
        }
        Ok(())
    }
}

#[async_trait]
impl PageElement for ScriptedElement {
    async fn text(&self) -> Result<String> {
        Ok(self.node.text.clone())
    }

    async fn is_visible(&self) -> Result<bool> {
        Ok(self.node.visible)
    }

    async fn clear(&self) -> Result<()> {
        self.act(Action::Clear(self.selector.clone()))
    }

    async fn type_text(&self, text: &str) -> Result<()> {
        self.act(Action::Type(self.selector.clone(), text.to_string()))
    }

    async fn click(&self) -> Result<()> {
        self.act(Action::Click(self.selector.clone()))
    }
}

/// Notifier that keeps every (title, message) pair
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<(String, String)>>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, title: &str, message: &str) {
        self.sent
            .lock()
            .unwrap()
            .push((title.to_string(), message.to_string()));
    }
}

pub fn config(json: &str) -> Config {
    json.parse().expect("test config should parse")
}
