//! Host-side graph widget.
//!
//! [`GraphWidget`] owns the renderer configuration, the point and link
//! tables with their encoded buffers, and the state the renderer reports
//! back. Every change to a synced field is stored, handed to observers and
//! pushed through the [`Channel`].

use std::collections::HashMap;

use bytes::Bytes;
use serde_json::{Map, Value};

use crate::{
    channel::{Channel, ChannelState, Inbound, Transport},
    command::Command,
    error::{Error, Result},
    event::Event,
    field::{FieldChange, FieldKind, FieldValue, NodeId, SyncedType, WidgetConfig},
    table::Table,
    transcode::Transcoder,
};

/// Synced field carrying the encoded point table.
pub const IPC_POINTS: &str = "_ipc_points";
/// Synced field carrying the encoded link table.
pub const IPC_LINKS: &str = "_ipc_links";
/// Index of the point the user last clicked, written by the renderer.
pub const CLICKED_POINT_INDEX: &str = "clicked_point_index";
/// Indices of the selected points, written by the renderer.
pub const SELECTED_POINT_INDICES: &str = "selected_point_indices";
/// Neighbours of the clicked node, host-only state fed by events.
pub const ADJACENT_NODE_IDS: &str = "adjacent_node_ids";

const STATE_FIELDS: &[(&str, FieldKind)] = &[
    (IPC_POINTS, FieldKind::Bytes),
    (IPC_LINKS, FieldKind::Bytes),
    (CLICKED_POINT_INDEX, FieldKind::Int),
    (SELECTED_POINT_INDICES, FieldKind::IntList),
    (ADJACENT_NODE_IDS, FieldKind::IdList),
];

type Observer = Box<dyn FnMut(&FieldChange)>;

/// Interactive graph view backed by a renderer on the other end of a
/// [`Transport`].
///
/// # Example
///
/// ```
/// use cosmolink::{Column, GraphWidget, MemoryTransport, Table, WidgetConfig};
///
/// let mut widget = GraphWidget::new(WidgetConfig::default());
/// let points = Table::new(vec![Column::new("id", vec![1i64, 2, 3])]).unwrap();
/// widget.set_points(points).unwrap();
///
/// let transport = MemoryTransport::new();
/// widget.attach(transport.clone()).unwrap();
/// widget.fit_view().unwrap();
/// assert_eq!(transport.syncs().len(), 1);
/// assert_eq!(transport.commands().len(), 1);
/// ```
pub struct GraphWidget<T: Transport> {
    config: WidgetConfig,
    transcoder: Transcoder,
    channel: Channel<T>,
    points: Option<Table>,
    links: Option<Table>,
    ipc_points: Option<Bytes>,
    ipc_links: Option<Bytes>,
    clicked_point_index: Option<i64>,
    selected_point_indices: Option<Vec<i64>>,
    adjacent_node_ids: Vec<NodeId>,
    observers: HashMap<String, Vec<Observer>>,
}

impl<T: Transport> GraphWidget<T> {
    /// Creates a widget. The set config fields are queued for the renderer
    /// and delivered on [`attach`](Self::attach).
    pub fn new(config: WidgetConfig) -> Self {
        let mut channel = Channel::new();
        for (name, value) in config.entries() {
            channel.enqueue_field(name.to_string(), value);
        }

        Self {
            config,
            transcoder: Transcoder::new(),
            channel,
            points: None,
            links: None,
            ipc_points: None,
            ipc_links: None,
            clicked_point_index: None,
            selected_point_indices: None,
            adjacent_node_ids: Vec::new(),
            observers: HashMap::new(),
        }
    }

    /// Uses `transcoder` for point and link tables set from now on.
    #[must_use]
    pub fn with_transcoder(mut self, transcoder: Transcoder) -> Self {
        self.transcoder = transcoder;
        self
    }

    /// Connects a renderer.
    ///
    /// The first attach delivers everything queued so far. Attaching again
    /// replaces the renderer and sends it a full snapshot of the config and
    /// buffers.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelClosed`] after [`close`](Self::close).
    pub fn attach(&mut self, transport: T) -> Result<()> {
        let reattach = self.channel.state() == ChannelState::Active;
        self.channel.attach(transport)?;
        if reattach {
            self.push_snapshot()?;
        }
        Ok(())
    }

    /// Delivers queued field syncs. Hosts call this once a renderer that
    /// attached before it was ready reports ready.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelClosed`] after [`close`](Self::close).
    pub fn flush(&mut self) -> Result<()> {
        self.channel.ensure_open()?;
        self.channel.flush();
        Ok(())
    }

    /// Disconnects the renderer for good.
    pub fn close(&mut self) {
        self.channel.close();
    }

    /// Replaces the point table.
    ///
    /// The table is encoded before anything changes; if encoding fails the
    /// previous table and buffer stay in place.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelClosed`] after close, or the encoding error.
    pub fn set_points(&mut self, table: Table) -> Result<()> {
        self.channel.ensure_open()?;
        let bytes = self.transcoder.encode(&table)?;
        tracing::debug!(rows = table.num_rows(), bytes = bytes.len(), "points updated");
        self.points = Some(table);
        let old = self.ipc_points.replace(bytes.clone());
        self.commit(IPC_POINTS, old.into(), FieldValue::Bytes(bytes))
    }

    /// Replaces the link table. Same contract as [`set_points`](Self::set_points).
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelClosed`] after close, or the encoding error.
    pub fn set_links(&mut self, table: Table) -> Result<()> {
        self.channel.ensure_open()?;
        let bytes = self.transcoder.encode(&table)?;
        tracing::debug!(rows = table.num_rows(), bytes = bytes.len(), "links updated");
        self.links = Some(table);
        let old = self.ipc_links.replace(bytes.clone());
        self.commit(IPC_LINKS, old.into(), FieldValue::Bytes(bytes))
    }

    /// Removes the point table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelClosed`] after close.
    pub fn clear_points(&mut self) -> Result<()> {
        self.channel.ensure_open()?;
        self.points = None;
        let old = self.ipc_points.take();
        self.commit(IPC_POINTS, old.into(), FieldValue::Null)
    }

    /// Removes the link table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelClosed`] after close.
    pub fn clear_links(&mut self) -> Result<()> {
        self.channel.ensure_open()?;
        self.links = None;
        let old = self.ipc_links.take();
        self.commit(IPC_LINKS, old.into(), FieldValue::Null)
    }

    /// Sets a config field by wire name. [`FieldValue::Null`] restores the
    /// renderer default.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for an unknown field or a value of
    /// the wrong kind, and [`Error::ChannelClosed`] after close.
    pub fn set(&mut self, name: &str, value: impl Into<FieldValue>) -> Result<()> {
        self.channel.ensure_open()?;
        let old = self.config.set(name, value.into())?;
        let new = self.config.get(name)?;
        self.commit(name, old, new)
    }

    /// Current value of any synced field, config or internal.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for an unknown field.
    pub fn get(&self, name: &str) -> Result<FieldValue> {
        match name {
            IPC_POINTS => Ok(self.ipc_points.clone().into()),
            IPC_LINKS => Ok(self.ipc_links.clone().into()),
            CLICKED_POINT_INDEX => Ok(self.clicked_point_index.into()),
            SELECTED_POINT_INDICES => Ok(self.selected_point_indices.clone().into()),
            ADJACENT_NODE_IDS => Ok(self.adjacent_node_ids.clone().into()),
            _ => self.config.get(name),
        }
    }

    /// Registers `handler` to run after every change of field `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if no field is called `name`.
    pub fn observe<F>(&mut self, name: &str, handler: F) -> Result<()>
    where
        F: FnMut(&FieldChange) + 'static,
    {
        if kind_of(name).is_none() {
            return Err(Error::invalid_config(format!(
                "cannot observe unknown field '{}'",
                name
            )));
        }
        self.observers
            .entry(name.to_string())
            .or_default()
            .push(Box::new(handler));
        Ok(())
    }

    /// Handles a raw message from the renderer. Messages the host does not
    /// understand are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelClosed`] after close.
    pub fn handle_message(&mut self, message: &Value) -> Result<()> {
        match self.channel.receive(message)? {
            Some(Inbound::Event(event)) => self.apply_event(event),
            Some(Inbound::StateUpdate(state)) => self.apply_frontend_state(&state)?,
            None => {}
        }
        Ok(())
    }

    /// Applies field values reported by the renderer.
    ///
    /// Only `clicked_point_index` and `selected_point_indices` are writable
    /// from the renderer; other keys and malformed values are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelClosed`] after close.
    pub fn apply_frontend_state(&mut self, state: &Map<String, Value>) -> Result<()> {
        self.channel.ensure_open()?;

        for (name, json) in state {
            let kind = match name.as_str() {
                CLICKED_POINT_INDEX => FieldKind::Int,
                SELECTED_POINT_INDICES => FieldKind::IntList,
                _ => {
                    tracing::debug!(field = name.as_str(), "ignoring update of read-only field");
                    continue;
                }
            };
            let value = match FieldValue::from_json(name, kind, json) {
                Ok(value) => value,
                Err(e) => {
                    tracing::debug!(field = name.as_str(), error = %e, "ignoring malformed update");
                    continue;
                }
            };

            let old = if kind == FieldKind::Int {
                let old: FieldValue = self.clicked_point_index.into();
                self.clicked_point_index = SyncedType::from_field(value.clone());
                old
            } else {
                let old = self.selected_point_indices.take().into();
                self.selected_point_indices = SyncedType::from_field(value.clone());
                old
            };
            self.notify(name, old, value);
        }
        Ok(())
    }

    fn apply_event(&mut self, event: Event) {
        match event {
            Event::AdjacentNodeIds(ids) => {
                let old = std::mem::replace(&mut self.adjacent_node_ids, ids);
                let new = FieldValue::IdList(self.adjacent_node_ids.clone());
                self.notify(ADJACENT_NODE_IDS, FieldValue::IdList(old), new);
            }
        }
    }

    /// Selects the point at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelClosed`] after close.
    pub fn select_point_by_index(&mut self, index: usize) -> Result<()> {
        self.channel.send_command(Command::SelectPointByIndex { index })
    }

    /// Selects the points at `indices`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelClosed`] after close.
    pub fn select_points_by_indices(&mut self, indices: &[usize]) -> Result<()> {
        self.channel.send_command(Command::SelectPointsByIndices {
            indices: indices.to_vec(),
        })
    }

    /// Enables rectangular selection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelClosed`] after close.
    pub fn activate_rect_selection(&mut self) -> Result<()> {
        self.channel.send_command(Command::ActivateRectSelection)
    }

    /// Disables rectangular selection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelClosed`] after close.
    pub fn deactivate_rect_selection(&mut self) -> Result<()> {
        self.channel.send_command(Command::DeactivateRectSelection)
    }

    /// Fits the view to all points.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelClosed`] after close.
    pub fn fit_view(&mut self) -> Result<()> {
        self.channel.send_command(Command::FitView)
    }

    /// Fits the view to the points at `indices`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelClosed`] after close.
    pub fn fit_view_by_indices(
        &mut self,
        indices: &[usize],
        duration: Option<f64>,
        padding: Option<f64>,
    ) -> Result<()> {
        self.channel.send_command(Command::FitViewByIndices {
            indices: indices.to_vec(),
            duration,
            padding,
        })
    }

    /// Fits the view to the given `[x, y]` coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelClosed`] after close.
    pub fn fit_view_by_coordinates(
        &mut self,
        coordinates: &[[f64; 2]],
        duration: Option<f64>,
        padding: Option<f64>,
    ) -> Result<()> {
        self.channel.send_command(Command::FitViewByCoordinates {
            coordinates: coordinates.to_vec(),
            duration,
            padding,
        })
    }

    /// Focuses the point at `index`, or clears focus with `None`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelClosed`] after close.
    pub fn focus_point(&mut self, index: Option<usize>) -> Result<()> {
        self.channel.send_command(Command::FocusPoint { index })
    }

    /// Starts the simulation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelClosed`] after close.
    pub fn start(&mut self, alpha: Option<f64>) -> Result<()> {
        self.channel.send_command(Command::Start { alpha })
    }

    /// Pauses the simulation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelClosed`] after close.
    pub fn pause(&mut self) -> Result<()> {
        self.channel.send_command(Command::Pause)
    }

    /// Restarts the simulation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelClosed`] after close.
    pub fn restart(&mut self) -> Result<()> {
        self.channel.send_command(Command::Restart)
    }

    /// Advances the simulation by one tick.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelClosed`] after close.
    pub fn step(&mut self) -> Result<()> {
        self.channel.send_command(Command::Step)
    }

    /// Renderer configuration.
    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    /// Transcoder used for point and link tables.
    pub fn transcoder(&self) -> &Transcoder {
        &self.transcoder
    }

    /// Underlying channel.
    pub fn channel(&self) -> &Channel<T> {
        &self.channel
    }

    /// Current point table.
    pub fn points(&self) -> Option<&Table> {
        self.points.as_ref()
    }

    /// Current link table.
    pub fn links(&self) -> Option<&Table> {
        self.links.as_ref()
    }

    /// Encoded point table.
    pub fn ipc_points(&self) -> Option<&Bytes> {
        self.ipc_points.as_ref()
    }

    /// Encoded link table.
    pub fn ipc_links(&self) -> Option<&Bytes> {
        self.ipc_links.as_ref()
    }

    /// Point the user last clicked, as reported by the renderer.
    pub fn clicked_point_index(&self) -> Option<i64> {
        self.clicked_point_index
    }

    /// Selected points, as reported by the renderer.
    pub fn selected_point_indices(&self) -> Option<&[i64]> {
        self.selected_point_indices.as_deref()
    }

    /// Neighbours of the last clicked node.
    pub fn adjacent_node_ids(&self) -> &[NodeId] {
        &self.adjacent_node_ids
    }

    fn commit(&mut self, name: &str, old: FieldValue, new: FieldValue) -> Result<()> {
        if old == new {
            return Ok(());
        }
        self.notify(name, old, new.clone());
        self.channel.push_field(name, new)
    }

    fn notify(&mut self, name: &str, old: FieldValue, new: FieldValue) {
        if old == new {
            return;
        }
        if let Some(handlers) = self.observers.get_mut(name) {
            let change = FieldChange {
                name: name.to_string(),
                old,
                new,
            };
            for handler in handlers.iter_mut() {
                handler(&change);
            }
        }
    }

    fn push_snapshot(&mut self) -> Result<()> {
        for (name, value) in self.config.entries() {
            self.channel.push_field(name, value)?;
        }
        if let Some(bytes) = &self.ipc_points {
            self.channel.push_field(IPC_POINTS, FieldValue::Bytes(bytes.clone()))?;
        }
        if let Some(bytes) = &self.ipc_links {
            self.channel.push_field(IPC_LINKS, FieldValue::Bytes(bytes.clone()))?;
        }
        Ok(())
    }
}

/// Kind of any synced field of a [`GraphWidget`], config or internal.
pub fn kind_of(name: &str) -> Option<FieldKind> {
    STATE_FIELDS
        .iter()
        .find(|(field, _)| *field == name)
        .map(|(_, kind)| *kind)
        .or_else(|| WidgetConfig::kind_of(name))
}

impl<T: Transport> std::fmt::Debug for GraphWidget<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphWidget")
            .field("channel", &self.channel)
            .field("points", &self.points.as_ref().map(Table::num_rows))
            .field("links", &self.links.as_ref().map(Table::num_rows))
            .field("clicked_point_index", &self.clicked_point_index)
            .field("observed", &self.observers.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
