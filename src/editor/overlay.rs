use crate::model::dom::ElementId;

/// What a highlight overlay is pointed at: one rendered element, or the
/// ordered member elements of a loose group.
#[derive(Clone, Debug, PartialEq)]
pub enum HighlightTarget {
    Element(ElementId),
    Elements(Vec<ElementId>),
}

/// Contract exposed to highlight renderers. Both calls are idempotent and
/// last-show-wins.
pub trait HighlightOverlay {
    fn show(&mut self, target: HighlightTarget);
    fn hide(&mut self);
}

/// Overlay state as tracked by the controller. A rendering host reads
/// [`Overlay::target`] after each transition and draws accordingly.
#[derive(Default, Debug)]
pub struct Overlay {
    shown: Option<HighlightTarget>,
}

impl Overlay {
    pub fn target(&self) -> Option<&HighlightTarget> { self.shown.as_ref() }

    pub fn is_shown(&self) -> bool { self.shown.is_some() }
}

impl HighlightOverlay for Overlay {
    fn show(&mut self, target: HighlightTarget) { self.shown = Some(target) }

    fn hide(&mut self) { self.shown = None }
}
