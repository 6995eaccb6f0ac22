//! Network topology: layers of units joined by weighted connections.
//!
//! All nodes of a [`Network`] live in maps owned by the network and are
//! addressed by typed handles. Layer and unit order is kept in vectors, and
//! every node caches its 1-based position, which is recomputed from the
//! vector whenever the order changes. A layer or unit may exist detached:
//! it is still owned by the network's maps but belongs to no container.
//! Handles are never reused, so a destroyed node's handle stays invalid.

mod connection;
mod extension;
mod layer;
mod network;
mod propagation;
mod unit;

pub use connection::Connection;
pub use extension::{Extension, LvqExtension, MlpExtension, SomExtension};
pub use layer::{Layer, LayerClass};
pub use network::Network;
pub use unit::Unit;

use std::fmt;

macro_rules! handle {
    ($(#[$doc:meta])* $name:ident, $prefix:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(usize);

        impl $name {
            /// Raw handle value.
            #[inline]
            pub fn id(&self) -> usize {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

handle!(
    /// Handle to a layer owned by a [`Network`].
    LayerId,
    "layer"
);
handle!(
    /// Handle to a unit owned by a [`Network`].
    UnitId,
    "unit"
);
handle!(
    /// Handle to a connection owned by a [`Network`].
    ConnectionId,
    "connection"
);

/// Where a newly created layer goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placement {
    /// Not attached to the network's layer sequence.
    Detached,
    /// Appended after the current last layer.
    #[default]
    Append,
    /// Inserted at this 1-based position.
    At(usize),
}

impl Placement {
    fn position(self) -> Option<Option<usize>> {
        match self {
            Placement::Detached => None,
            Placement::Append => Some(None),
            Placement::At(p) => Some(Some(p)),
        }
    }
}
