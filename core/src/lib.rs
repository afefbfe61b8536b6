pub mod amino_acid;
pub mod builder;
pub mod config;
pub mod error;
pub mod extract;
pub mod inspect;
pub mod layout;
pub mod model;

pub use amino_acid::AminoAcid;
pub use builder::GraphBuilder;
pub use error::{GraphError, Result};
pub use extract::{extract_coordinates, extract_sequence, extract_sequence_with, DecodePolicy};
pub use inspect::{inspect, inspect_with, GraphReport};
pub use model::{GraphKind, GraphRecord, ProteinGraph};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub fn init_tracing() {
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);

    let filter_layer = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
