//! The canonical store: synchronous dispatch, pure reduction, listeners.

use harbor_common::Envelope;

use crate::reducers;
use crate::state::AppState;

pub type SubscriptionId = u64;

type Listener = Box<dyn FnMut(&AppState, &Envelope) + Send>;

/// Holds one state tree and applies envelopes to it.
///
/// `dispatch` is synchronous with respect to reducer application; listeners
/// observe the post-mutation state. The store itself never forwards
/// envelopes anywhere — that is the bus's job, and the bus decides the
/// forward-before-apply ordering explicitly.
pub struct Store {
    state: AppState,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: SubscriptionId,
}

impl Store {
    pub fn new(initial: AppState) -> Self {
        Self {
            state: initial,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Apply the envelope through every slice reducer, then notify
    /// listeners with the post-mutation state.
    pub fn dispatch(&mut self, envelope: &Envelope) {
        let previous = std::mem::take(&mut self.state);
        self.state = reducers::reduce(previous, envelope);

        for (_, listener) in self.listeners.iter_mut() {
            listener(&self.state, envelope);
        }
    }

    /// Register a listener; returns an id for [`Store::unsubscribe`].
    pub fn subscribe(
        &mut self,
        listener: impl FnMut(&AppState, &Envelope) + Send + 'static,
    ) -> SubscriptionId {
        let id = self.next_subscription;
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns false if the id was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sub, _)| *sub != id);
        self.listeners.len() != before
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new(AppState::default())
    }
}
