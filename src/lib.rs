//! cosmolink - host-side bridge to an interactive graph renderer
//!
//! Converts tabular point and link data into Arrow IPC streams and keeps a
//! renderer in sync with the host over a message channel.
//!
//! # Design Principles
//!
//! 1. **Arrow on the wire** - tables travel as Arrow IPC streams any Arrow
//!    reader can decode
//! 2. **Latest value wins** - field syncs are coalesced, commands are
//!    fire-and-forget
//! 3. **Host owns the state** - the renderer writes back only the selection
//!    fields
//!
//! # Quick Start
//!
//! ```
//! use cosmolink::{Column, GraphWidget, MemoryTransport, Table, WidgetConfig};
//!
//! let points = Table::new(vec![
//!     Column::new("id", vec![1i64, 2, 3]),
//!     Column::new("label", vec!["a", "b", "c"]),
//! ])
//! .unwrap();
//!
//! let config = WidgetConfig {
//!     point_id: Some("id".into()),
//!     point_label: Some("label".into()),
//!     ..WidgetConfig::default()
//! };
//!
//! let mut widget = GraphWidget::new(config);
//! widget.set_points(points).unwrap();
//!
//! let renderer = MemoryTransport::new();
//! widget.attach(renderer.clone()).unwrap();
//! widget.focus_point(Some(2)).unwrap();
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
// Allow common test patterns
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::cast_lossless,
        clippy::cast_possible_truncation,
        clippy::cast_possible_wrap,
        clippy::cast_precision_loss,
        clippy::redundant_clone,
        clippy::float_cmp,
        clippy::unreadable_literal
    )
)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

pub mod channel;
/// CLI module for command-line interface
#[cfg(feature = "cli")]
pub mod cli;
pub mod command;
pub mod error;
pub mod event;
pub mod field;
pub mod table;
pub mod transcode;
pub mod widget;

pub use channel::{
    Channel, ChannelState, Inbound, MemoryTransport, Outbound, Transport, WireMessage,
};
pub use command::Command;
pub use error::{Error, Result};
pub use event::Event;
pub use field::{
    Color, FieldChange, FieldKind, FieldValue, NodeId, Seed, SyncedType, WidgetConfig,
};
pub use table::{Column, ColumnData, ScalarType, Table};
pub use transcode::{decode, encode, Decoded, IntNarrowing, Transcoder};
pub use widget::{
    GraphWidget, ADJACENT_NODE_IDS, CLICKED_POINT_INDEX, IPC_LINKS, IPC_POINTS,
    SELECTED_POINT_INDICES,
};
