pub mod alignment;
pub mod config;
pub mod data;
pub mod error;
pub mod frame;
pub mod link;
pub mod logging;
pub mod readout;
pub mod workspace;

pub use alignment::{
    AlignmentMethod, AlignmentState, MarkerCoords, Region, RegionCoords, Subset, Tool, ViewLimits,
    ViewerState,
};
pub use config::Config;
pub use data::Dataset;
pub use error::{AlignError, AlignResult};
pub use frame::{CoordinateFrame, FitsWcs, FrameCapabilities, TransformChain, TransformStep};
pub use link::{AlignMode, FallbackScheme, LinkKind, LinkOptions, LinkSet};
pub use readout::{CursorReadout, ViewerEvent};
pub use workspace::{Workspace, DEFAULT_VIEWER};

pub type Result<T> = anyhow::Result<T>;
