use crate::list::ListId;
use crate::model::setup::TileId;

/// One previously visited navigation context.
#[derive(Clone, Debug, PartialEq)]
pub struct Crumb {
    pub list: ListId,
    pub scope: Option<TileId>,
    pub name: String,
}

/// Scope history. Pushed on scope-in, truncated on scope-out and scope-to,
/// cleared on a full reset; its lifecycle is tied 1:1 to navigation.
#[derive(Default)]
pub struct Breadcrumb {
    entries: Vec<Crumb>,
}

impl Breadcrumb {
    pub fn push(&mut self, crumb: Crumb) { self.entries.push(crumb) }

    pub fn pop(&mut self) -> Option<Crumb> { self.entries.pop() }

    /// Removes the entry at `index` and everything after it, returning the
    /// entry itself: the target context for a scope-to jump.
    pub fn truncate_through(&mut self, index: usize) -> Option<Crumb> {
        if index >= self.entries.len() {
            return None;
        }
        let crumb = self.entries[index].clone();
        self.entries.truncate(index);
        Some(crumb)
    }

    pub fn clear(&mut self) { self.entries.clear() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn entries(&self) -> &[Crumb] { &self.entries }
}
