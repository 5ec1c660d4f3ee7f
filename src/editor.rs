pub mod breadcrumb;
pub mod controller;
pub mod locator;
pub mod message;
pub mod namer;
pub mod overlay;

pub use breadcrumb::{Breadcrumb, Crumb};
pub use controller::{
    CommonValue, EditorError, FieldValue, PointerEvent, SetupField, SimpleEditor,
};
pub use locator::TileRef;
pub use overlay::{HighlightOverlay, HighlightTarget, Overlay};
