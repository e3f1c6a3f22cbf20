//! In-process selection channel with two independent streams: part and colour.
//!
//! Each stream holds a current value and replays it to new subscribers. Publishing is
//! synchronous: every subscriber has run by the time `publish` returns.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

pub const DEFAULT_PART: &str = "car";
pub const DEFAULT_COLOR: &str = "black";

type Callback = Rc<dyn Fn(&str)>;

struct StreamState {
    current: String,
    next_id: u64,
    subscribers: Vec<(u64, Callback)>,
}

/// One observable value.
#[derive(Clone)]
pub struct SelectionStream {
    name: &'static str,
    state: Rc<RefCell<StreamState>>,
}

impl SelectionStream {
    fn new(name: &'static str, initial: &str) -> Self {
        Self {
            name,
            state: Rc::new(RefCell::new(StreamState {
                current: initial.to_string(),
                next_id: 0,
                subscribers: Vec::new(),
            })),
        }
    }

    pub fn current(&self) -> String {
        self.state.borrow().current.clone()
    }

    pub fn subscriber_count(&self) -> usize {
        self.state.borrow().subscribers.len()
    }

    /// Registers `callback` and immediately calls it with the current value.
    pub fn subscribe(&self, callback: impl Fn(&str) + 'static) -> Subscription {
        let callback: Callback = Rc::new(callback);
        let (id, current) = {
            let mut state = self.state.borrow_mut();
            let id = state.next_id;
            state.next_id += 1;
            state.subscribers.push((id, callback.clone()));
            (id, state.current.clone())
        };
        callback(&current);
        Subscription { stream: Rc::downgrade(&self.state), id }
    }

    /// Stores `value` and delivers it to every subscriber registered at the time of the call.
    pub fn publish(&self, value: &str) {
        let callbacks: Vec<Callback> = {
            let mut state = self.state.borrow_mut();
            state.current = value.to_string();
            state.subscribers.iter().map(|(_, callback)| callback.clone()).collect()
        };
        log::trace!("{} <- '{}' ({} subscribers)", self.name, value, callbacks.len());
        for callback in callbacks {
            callback(value);
        }
    }
}

impl fmt::Debug for SelectionStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("SelectionStream")
            .field("name", &self.name)
            .field("current", &state.current)
            .field("subscribers", &state.subscribers.len())
            .finish()
    }
}

/// Drop guard returned by [`SelectionStream::subscribe`].
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    stream: Weak<RefCell<StreamState>>,
    id: u64,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(state) = self.stream.upgrade() {
            if let Ok(mut state) = state.try_borrow_mut() {
                state.subscribers.retain(|(id, _)| *id != self.id);
            }
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

/// Part and colour selection, shared between the UI shell and the viewer.
///
/// There is no combined event: a colour subscriber sees whatever part was published last.
#[derive(Debug)]
pub struct SelectionChannel {
    part: SelectionStream,
    color: SelectionStream,
}

impl SelectionChannel {
    pub fn new() -> Self {
        Self {
            part: SelectionStream::new("part", DEFAULT_PART),
            color: SelectionStream::new("color", DEFAULT_COLOR),
        }
    }

    pub fn part(&self) -> &SelectionStream {
        &self.part
    }

    pub fn color(&self) -> &SelectionStream {
        &self.color
    }

    pub fn select_part(&self, name: &str) {
        self.part.publish(name);
    }

    pub fn select_color(&self, name: &str) {
        self.color.publish(name);
    }

    /// Publishes `part` then `color`.
    pub fn select(&self, part: &str, color: &str) {
        self.select_part(part);
        self.select_color(color);
    }

    pub fn current_part(&self) -> String {
        self.part.current()
    }

    pub fn current_color(&self) -> String {
        self.color.current()
    }
}

impl Default for SelectionChannel {
    fn default() -> Self {
        Self::new()
    }
}
