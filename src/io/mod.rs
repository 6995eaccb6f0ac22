//! File formats: network configurations, triple data files and control
//! tables.

pub mod network_file;
pub mod table;
pub mod triples;

pub use network_file::{parse_network, read_network, render_network, write_network, write_network_to};
pub use table::{Cell, Column, ColumnKind, Table};
pub use triples::{load_triple_table, load_triples, parse_triples};
