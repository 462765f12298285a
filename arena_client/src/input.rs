//! Input sampling.
//!
//! Tracks which keys are currently held and answers semantic action queries.
//! Purely level-triggered: no debouncing, no edge detection. Key transitions
//! arrive as data — the platform backend that produces them (window loop,
//! virtual controls, a test) is out of scope — so the sampler behaves the
//! same everywhere.

use std::collections::{HashMap, HashSet};

use arena_shared::protocol::ClientMsg;

/// Semantic movement actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::Up, Action::Down, Action::Left, Action::Right];
}

/// A raw key transition reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyEvent {
    Down(String),
    Up(String),
}

/// Action -> trigger-key bindings.
///
/// Defaults: `up:{w,arrowup}`, `down:{s,arrowdown}`, `left:{a,arrowleft}`,
/// `right:{d,arrowright}`. Keys are compared case-insensitively.
#[derive(Debug, Clone)]
pub struct InputBindings {
    map: HashMap<Action, HashSet<String>>,
}

impl Default for InputBindings {
    fn default() -> Self {
        let mut bindings = Self {
            map: HashMap::new(),
        };
        bindings.bind(Action::Up, ["w", "arrowup"]);
        bindings.bind(Action::Down, ["s", "arrowdown"]);
        bindings.bind(Action::Left, ["a", "arrowleft"]);
        bindings.bind(Action::Right, ["d", "arrowright"]);
        bindings
    }
}

impl InputBindings {
    /// Replaces the full key set for one action; other actions keep theirs.
    pub fn bind<I, K>(&mut self, action: Action, keys: I)
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.map.insert(
            action,
            keys.into_iter().map(|k| normalize(&k.into())).collect(),
        );
    }

    /// True if any action binds this key.
    ///
    /// A platform backend uses this to decide which key-down defaults (page
    /// scrolling on arrow keys, say) to swallow. Key-up observation stays
    /// unconditional so a key can never stick.
    pub fn is_bound(&self, key: &str) -> bool {
        let key = normalize(key);
        self.map.values().any(|set| set.contains(&key))
    }
}

/// Currently held directional actions, as carried by an intent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirState {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

/// Held-key tracker with semantic action queries.
#[derive(Debug, Default)]
pub struct InputSampler {
    bindings: InputBindings,
    held: HashSet<String>,
}

impl InputSampler {
    pub fn new(bindings: InputBindings) -> Self {
        Self {
            bindings,
            held: HashSet::new(),
        }
    }

    /// Applies one key transition. Unbound keys are tracked too; bindings
    /// decide what they mean at query time.
    pub fn apply(&mut self, event: &KeyEvent) {
        match event {
            KeyEvent::Down(key) => {
                self.held.insert(normalize(key));
            }
            KeyEvent::Up(key) => {
                self.held.remove(&normalize(key));
            }
        }
    }

    /// True iff at least one key bound to `action` is currently held.
    ///
    /// Opposite actions held together both report active; resolving that is
    /// the server's concern.
    pub fn is_active(&self, action: Action) -> bool {
        self.bindings
            .map
            .get(&action)
            .map_or(false, |keys| keys.iter().any(|k| self.held.contains(k)))
    }

    /// All four directional states at this instant.
    pub fn directions(&self) -> DirState {
        DirState {
            up: self.is_active(Action::Up),
            down: self.is_active(Action::Down),
            left: self.is_active(Action::Left),
            right: self.is_active(Action::Right),
        }
    }

    /// Drops every held key. Invoked when the key-event feed detaches so a
    /// vanished source cannot leave a key stuck down.
    pub fn release_all(&mut self) {
        self.held.clear();
    }

    pub fn bindings(&self) -> &InputBindings {
        &self.bindings
    }
}

/// Turns sampled input into the per-tick intent message.
pub fn build_intent(id: &str, dirs: DirState) -> ClientMsg {
    ClientMsg::Input {
        id: id.to_string(),
        up: dirs.up,
        down: dirs.down,
        left: dirs.left,
        right: dirs.right,
    }
}

fn normalize(key: &str) -> String {
    key.to_ascii_lowercase()
}
