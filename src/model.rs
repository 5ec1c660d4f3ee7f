pub mod dom;
pub mod setup;

pub use dom::{ElementId, ElementTree};
pub use setup::{
    FlowDirection, SetupData, SetupError, SetupKey, SetupTree, SetupValues, SizeValue, TileId,
    cmp_priority, cmp_priority_desc,
};
