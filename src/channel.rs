//! Duplex channel between the host and one renderer instance.
//!
//! Outbound traffic goes through a single queue:
//!
//! - **field syncs** are level-triggered. A newer sync for a field that is
//!   still queued replaces the older one, so only the latest value is ever
//!   delivered. Syncs queued before the renderer attaches are flushed on
//!   attach.
//! - **commands** are edge-triggered and best-effort. They are delivered in
//!   FIFO order while the channel is active and the transport is ready, and
//!   silently dropped otherwise. They are never retried.
//!
//! Inbound messages are parsed into [`Inbound`] values; anything the host
//! does not understand is ignored.
//!
//! The channel moves `Uninitialized -> Active -> Closed`. Once closed, every
//! operation fails with [`Error::ChannelClosed`].

use std::{cell::RefCell, collections::VecDeque, rc::Rc};

use bytes::Bytes;
use serde_json::{json, Map, Value};

use crate::{
    command::Command,
    error::{Error, Result},
    event::Event,
    field::FieldValue,
};

/// Lifecycle state of a [`Channel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// No renderer attached yet.
    Uninitialized,
    /// A renderer is attached.
    Active,
    /// Torn down; terminal.
    Closed,
}

/// A message from the host to the renderer.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    /// New value of a synced field.
    Sync {
        /// Wire name of the field.
        field: String,
        /// The value.
        value: FieldValue,
    },
    /// A one-shot command.
    Command(Command),
}

/// JSON payload plus out-of-band binary buffers.
#[derive(Debug, Clone, PartialEq)]
pub struct WireMessage {
    /// JSON content of the message.
    pub content: Value,
    /// Binary buffers referenced by `buffer_paths` in the content.
    pub buffers: Vec<Bytes>,
}

impl Outbound {
    /// Wire envelope of the message.
    ///
    /// Syncs become `{"method": "update", "state": {..}, "buffer_paths": [..]}`
    /// with byte buffers moved into [`WireMessage::buffers`]; commands become
    /// `{"method": "custom", "content": {"type": ..}}`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if a command cannot be serialized.
    pub fn to_wire(&self) -> Result<WireMessage> {
        match self {
            Self::Sync { field, value } => {
                let mut state = Map::new();
                state.insert(field.clone(), value.to_json());

                let (buffer_paths, buffers) = match value {
                    FieldValue::Bytes(bytes) => (json!([[field]]), vec![bytes.clone()]),
                    _ => (json!([]), Vec::new()),
                };

                Ok(WireMessage {
                    content: json!({
                        "method": "update",
                        "state": state,
                        "buffer_paths": buffer_paths,
                    }),
                    buffers,
                })
            }
            Self::Command(command) => Ok(WireMessage {
                content: json!({
                    "method": "custom",
                    "content": command.to_json()?,
                }),
                buffers: Vec::new(),
            }),
        }
    }
}

/// A message from the renderer to the host.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// A tagged event.
    Event(Event),
    /// Field values the renderer changed.
    StateUpdate(Map<String, Value>),
}

/// Delivers outbound messages to the renderer.
///
/// Implemented by the host widget framework.
pub trait Transport {
    /// Delivers one message.
    ///
    /// # Errors
    ///
    /// Returns an error if the message could not be handed to the renderer.
    /// The channel logs it and drops the message.
    fn deliver(&mut self, message: &Outbound) -> Result<()>;

    /// Whether the renderer can take messages right now.
    fn is_ready(&self) -> bool {
        true
    }
}

#[derive(Debug, Default)]
struct MemoryRecord {
    messages: Vec<Outbound>,
    not_ready: bool,
}

/// A transport that records messages in memory.
///
/// Clones share the same record, so a host can keep one handle and give the
/// other to a channel.
///
/// # Example
///
/// ```
/// use cosmolink::{Channel, Command, MemoryTransport};
///
/// let transport = MemoryTransport::new();
/// let mut channel = Channel::new();
/// channel.attach(transport.clone()).unwrap();
/// channel.send_command(Command::FitView).unwrap();
/// assert_eq!(transport.commands(), vec![Command::FitView]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    record: Rc<RefCell<MemoryRecord>>,
}

impl MemoryTransport {
    /// Creates an empty, ready transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the renderer as ready or not.
    pub fn set_ready(&self, ready: bool) {
        self.record.borrow_mut().not_ready = !ready;
    }

    /// All delivered messages, oldest first.
    pub fn messages(&self) -> Vec<Outbound> {
        self.record.borrow().messages.clone()
    }

    /// Removes and returns all delivered messages.
    pub fn take(&self) -> Vec<Outbound> {
        std::mem::take(&mut self.record.borrow_mut().messages)
    }

    /// Number of delivered messages.
    pub fn len(&self) -> usize {
        self.record.borrow().messages.len()
    }

    /// Returns true if nothing was delivered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Delivered commands, oldest first.
    pub fn commands(&self) -> Vec<Command> {
        self.record
            .borrow()
            .messages
            .iter()
            .filter_map(|m| match m {
                Outbound::Command(c) => Some(c.clone()),
                Outbound::Sync { .. } => None,
            })
            .collect()
    }

    /// Delivered syncs as `(field, value)`, oldest first.
    pub fn syncs(&self) -> Vec<(String, FieldValue)> {
        self.record
            .borrow()
            .messages
            .iter()
            .filter_map(|m| match m {
                Outbound::Sync { field, value } => Some((field.clone(), value.clone())),
                Outbound::Command(_) => None,
            })
            .collect()
    }
}

impl Transport for MemoryTransport {
    fn deliver(&mut self, message: &Outbound) -> Result<()> {
        self.record.borrow_mut().messages.push(message.clone());
        Ok(())
    }

    fn is_ready(&self) -> bool {
        !self.record.borrow().not_ready
    }
}

/// Host side of the host/renderer channel.
pub struct Channel<T: Transport> {
    state: ChannelState,
    transport: Option<T>,
    queue: VecDeque<Outbound>,
    dropped_commands: u64,
}

impl<T: Transport> Default for Channel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport> Channel<T> {
    /// Creates an unattached channel.
    pub fn new() -> Self {
        Self {
            state: ChannelState::Uninitialized,
            transport: None,
            queue: VecDeque::new(),
            dropped_commands: 0,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ChannelState {
        self.state
    }

    /// Returns true once the channel is closed.
    pub fn is_closed(&self) -> bool {
        self.state == ChannelState::Closed
    }

    /// Fails with [`Error::ChannelClosed`] if the channel is closed.
    ///
    /// # Errors
    ///
    /// See above.
    pub fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            Err(Error::ChannelClosed)
        } else {
            Ok(())
        }
    }

    /// The attached transport, if any.
    pub fn transport(&self) -> Option<&T> {
        self.transport.as_ref()
    }

    /// Number of queued, undelivered messages.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Number of commands dropped because no ready renderer was attached.
    pub fn dropped_commands(&self) -> u64 {
        self.dropped_commands
    }

    /// Attaches a renderer and flushes queued syncs to it. Attaching again
    /// replaces the previous transport.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelClosed`] if the channel is closed.
    pub fn attach(&mut self, transport: T) -> Result<()> {
        self.ensure_open()?;
        if self.transport.replace(transport).is_some() {
            tracing::info!("renderer transport replaced");
        } else {
            tracing::info!(queued = self.queue.len(), "renderer attached");
        }
        self.state = ChannelState::Active;
        self.flush();
        Ok(())
    }

    /// Queues the latest value of a synced field, replacing any queued value
    /// for the same field.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelClosed`] if the channel is closed.
    pub fn push_field(&mut self, field: impl Into<String>, value: FieldValue) -> Result<()> {
        self.ensure_open()?;
        self.enqueue_field(field.into(), value);
        self.flush();
        Ok(())
    }

    /// Queues a sync without delivering it, replacing any queued value for
    /// the same field. Used to seed the queue of a channel that cannot be
    /// closed yet.
    pub(crate) fn enqueue_field(&mut self, field: String, value: FieldValue) {
        self.queue
            .retain(|m| !matches!(m, Outbound::Sync { field: queued, .. } if *queued == field));
        self.queue.push_back(Outbound::Sync { field, value });
    }

    /// Sends a command if a ready renderer is attached; drops it otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelClosed`] if the channel is closed. A dropped
    /// command is not an error.
    pub fn send_command(&mut self, command: Command) -> Result<()> {
        self.ensure_open()?;
        if !self.is_deliverable() {
            self.dropped_commands += 1;
            tracing::debug!(command = command.name(), "renderer not ready, command dropped");
            return Ok(());
        }
        self.queue.push_back(Outbound::Command(command));
        self.flush();
        Ok(())
    }

    /// Parses a message from the renderer.
    ///
    /// Accepts bare event objects (`{"msg_type": ..}`), custom-message
    /// envelopes (`{"method": "custom", "content": {..}}`) and state updates
    /// (`{"method": "update", "state": {..}}`). Returns `Ok(None)` for
    /// anything else.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelClosed`] if the channel is closed.
    pub fn receive(&mut self, message: &Value) -> Result<Option<Inbound>> {
        self.ensure_open()?;

        let inbound = match message.get("method").and_then(Value::as_str) {
            Some("update") => message
                .get("state")
                .and_then(Value::as_object)
                .cloned()
                .map(Inbound::StateUpdate),
            Some("custom") => message
                .get("content")
                .and_then(Event::parse)
                .map(Inbound::Event),
            Some(other) => {
                tracing::debug!(method = other, "ignoring frontend message");
                None
            }
            None => Event::parse(message).map(Inbound::Event),
        };
        Ok(inbound)
    }

    /// Delivers queued messages while a ready renderer is attached. Delivery
    /// failures are logged and the message is discarded.
    pub fn flush(&mut self) {
        if !self.is_deliverable() {
            return;
        }
        let Some(transport) = self.transport.as_mut() else {
            return;
        };

        while let Some(message) = self.queue.pop_front() {
            if let Err(e) = transport.deliver(&message) {
                match &message {
                    Outbound::Sync { field, .. } => {
                        tracing::warn!(field = field.as_str(), error = %e, "field sync not delivered");
                    }
                    Outbound::Command(command) => {
                        tracing::warn!(command = command.name(), error = %e, "command not delivered");
                    }
                }
            }
        }
    }

    /// Tears the channel down. Queued messages are discarded. Closing twice
    /// is a no-op.
    pub fn close(&mut self) {
        if self.is_closed() {
            return;
        }
        self.state = ChannelState::Closed;
        self.transport = None;
        self.queue.clear();
        tracing::info!("channel closed");
    }

    fn is_deliverable(&self) -> bool {
        self.state == ChannelState::Active && self.transport.as_ref().is_some_and(T::is_ready)
    }
}

impl<T: Transport> std::fmt::Debug for Channel<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("state", &self.state)
            .field("attached", &self.transport.is_some())
            .field("pending", &self.queue.len())
            .field("dropped_commands", &self.dropped_commands)
            .finish_non_exhaustive()
    }
}
