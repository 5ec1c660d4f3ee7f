use std::fmt;

use crate::model::dom::{ElementId, ElementTree};
use crate::model::setup::{SetupData, SetupError, SetupKey, SetupTree, SetupValues, TileId};

/// Index of a layout root within a [`Workspace`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListId(pub usize);

impl fmt::Display for ListId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "list#{}", self.0) }
}

/// Persistence collaborator for one layout root.
pub trait SetupSync {
    fn save(&mut self, setup: &SetupValues);
    fn revert(&mut self) -> Option<SetupValues>;
    fn stored(&self) -> Option<&SetupValues>;
}

/// One rendered layout-engine instance. The engine owns rendering and
/// geometry; the structural tree operations have default implementations
/// here because they are pure setup-tree edits.
pub trait TileList {
    /// The layout root's own element in the document.
    fn element(&self) -> ElementId;

    /// Root of the rendered subtree, where tile events originate.
    fn shadow_container(&self) -> ElementId;

    fn setup(&self) -> &SetupTree;

    fn setup_mut(&mut self) -> &mut SetupTree;

    /// Currently rendered element for a tile id. Rebuilt by the engine on
    /// every refresh; callers must not hold the result across one.
    fn tile(&self, id: &TileId) -> Option<ElementId>;

    /// Recomputes the rendering. `hard` forces a full teardown, after which
    /// all previously returned tile elements are stale.
    fn refresh(&mut self, dom: &mut ElementTree, hard: bool);

    fn sync(&mut self) -> Option<&mut dyn SetupSync> { None }

    /// Fallback setup snapshot used by reset.
    fn default_setup(&self) -> Option<&SetupValues> { None }

    fn replace_setup(&mut self, values: &SetupValues) -> Result<(), SetupError> {
        *self.setup_mut() = SetupTree::from_values(values)?;
        Ok(())
    }

    /// Swap-with-adjacent-sibling by priority.
    fn reprioritize_item(&mut self, item: SetupKey, up: bool) -> bool {
        self.setup_mut().reprioritize(item, up)
    }

    /// Creates a new container node under `parent` (the root when absent)
    /// and returns it. A generated `group_N` id is used unless the setup
    /// fields carry a display name of their own.
    fn create_new_container(
        &mut self,
        name: Option<&str>,
        parent: Option<SetupKey>,
        fields: SetupData,
        as_group: bool,
    ) -> SetupKey {
        let tree = self.setup_mut();
        let mut fields = fields;
        if let Some(name) = name {
            fields.name = Some(name.to_owned());
        }
        let id = tree.next_group_id();
        let key = tree.new_item(id, fields, as_group);
        let parent = parent.unwrap_or(tree.root());
        tree.attach(key, parent, false);
        key
    }

    fn move_to_container(&mut self, item: SetupKey, target: SetupKey, at_front: bool) {
        self.setup_mut().attach(item, target, at_front);
    }

    /// Deletes a container, merging its children back into its parent.
    fn delete_container(&mut self, item: SetupKey) { self.setup_mut().dissolve(item) }
}

/// The document as the editor sees it: one element tree plus every tracked
/// layout root rendered into it.
pub struct Workspace<L> {
    pub dom: ElementTree,
    pub lists: Vec<L>,
}

impl<L: TileList> Workspace<L> {
    pub fn new(dom: ElementTree, lists: Vec<L>) -> Self { Workspace { dom, lists } }

    pub fn list(&self, id: ListId) -> &L { &self.lists[id.0] }

    pub fn list_mut(&mut self, id: ListId) -> &mut L { &mut self.lists[id.0] }

    pub fn ids(&self) -> impl Iterator<Item = ListId> { (0..self.lists.len()).map(ListId) }

    /// Lists whose element is not rendered inside another tracked list.
    pub fn top_level_lists(&self) -> Vec<ListId> {
        self.ids()
            .filter(|&id| {
                let el = self.lists[id.0].element();
                !self
                    .dom
                    .composed_ancestors(el)
                    .skip(1)
                    .any(|a| self.lists.iter().any(|l| l.element() == a))
            })
            .collect()
    }
}
