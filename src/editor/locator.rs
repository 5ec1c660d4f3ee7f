use crate::editor::overlay::HighlightTarget;
use crate::list::{ListId, TileList};
use crate::model::dom::{ElementId, ElementTree};
use crate::model::setup::{SetupKey, TileId};

/// Attribute carrying a tile's setup id on its rendered element.
pub const TILE_ATTR: &str = "data-tile";
pub const TILE_CLASS: &str = "tile";
pub const TILE_BACKGROUND_CLASS: &str = "tile-background";

/// A resolved tile: either one rendered element, or the ordered member
/// elements of a loose group, which has no single rendered container.
#[derive(Clone, Debug, PartialEq)]
pub enum TileRef {
    Single { id: TileId, element: ElementId },
    LooseGroup { id: TileId, elements: Vec<ElementId> },
}

impl TileRef {
    pub fn id(&self) -> &TileId {
        match self {
            TileRef::Single { id, .. } | TileRef::LooseGroup { id, .. } => id,
        }
    }

    pub fn elements(&self) -> Vec<ElementId> {
        match self {
            TileRef::Single { element, .. } => vec![*element],
            TileRef::LooseGroup { elements, .. } => elements.clone(),
        }
    }

    pub fn highlight_target(&self) -> HighlightTarget {
        match self {
            TileRef::Single { element, .. } => HighlightTarget::Element(*element),
            TileRef::LooseGroup { elements, .. } => HighlightTarget::Elements(elements.clone()),
        }
    }
}

pub fn is_tile(dom: &ElementTree, el: ElementId) -> bool {
    dom.has_class(el, TILE_CLASS)
        || dom.has_class(el, TILE_BACKGROUND_CLASS)
        || dom.has_attr(el, TILE_ATTR)
}

pub fn tile_id(dom: &ElementTree, el: ElementId) -> Option<TileId> {
    dom.attr(el, TILE_ATTR)
        .or_else(|| dom.attr(el, "id"))
        .map(TileId::from_attr)
}

pub fn is_list(dom: &ElementTree, el: ElementId, selectors: &[String]) -> bool {
    let tag = dom.tag(el);
    selectors.iter().any(|s| s == tag)
}

/// A tile belongs to a list when it is a direct light-DOM child of the list
/// element, or its rendered subtree is hosted by the list element. Tiles of
/// a nested list reach that inner list's host first and are not ours.
fn is_list_tile<L: TileList>(dom: &ElementTree, list: &L, el: ElementId) -> bool {
    if !is_tile(dom, el) {
        return false;
    }
    if dom.parent(el) == Some(list.element()) {
        return true;
    }
    let mut top = el;
    while let Some(parent) = dom.parent(top) {
        top = parent;
    }
    dom.host(top) == Some(list.element())
}

/// Resolves a hit path (innermost-first) to the logical tile it targets
/// within `list`, honoring the navigation scope: the deepest owned marked
/// element wins, then its setup is walked up to the immediate child of the
/// scope (or the topmost group under the root when unscoped). Absent or
/// ambiguous input yields `None`.
pub fn resolve_tile_from_event<L: TileList>(
    dom: &ElementTree,
    list: &L,
    scope: Option<&TileId>,
    path: &[ElementId],
) -> Option<TileRef> {
    let tree = list.setup();
    let scope_key = match scope {
        Some(id) => Some(tree.find(id)?),
        None => None,
    };
    let scope_el = scope.and_then(|id| list.tile(id));

    let mut target = None;
    for &el in path {
        if Some(el) == scope_el {
            break;
        }
        if is_list_tile(dom, list, el) {
            target = Some(el);
        }
    }
    let id = tile_id(dom, target?)?;
    let key = tree.find(&id)?;
    let top = tree.top_child_under(key, scope_key)?;
    tile_ref_for(list, top)
}

/// Builds the tile reference for a setup node: its rendered element, or the
/// synthetic member collection when the node is a loose group.
pub fn tile_ref_for<L: TileList>(list: &L, key: SetupKey) -> Option<TileRef> {
    let tree = list.setup();
    let id = tree.id(key).clone();
    if tree.is_group(key) && !tree.data(key).tight_group {
        Some(TileRef::LooseGroup {
            id,
            elements: loose_members(list, key),
        })
    } else {
        let element = list.tile(&id)?;
        Some(TileRef::Single { id, element })
    }
}

/// Rendered elements of a loose group's members in display order, recursing
/// into nested loose groups. Tight groups count as single members.
fn loose_members<L: TileList>(list: &L, key: SetupKey) -> Vec<ElementId> {
    let tree = list.setup();
    let mut elements = Vec::new();
    for child in tree.children_by_priority(key, true) {
        if tree.is_group(child) && !tree.data(child).tight_group {
            elements.extend(loose_members(list, child));
        } else if let Some(el) = list.tile(tree.id(child)) {
            elements.push(el);
        }
    }
    elements
}

/// The innermost layout root along a hit path. When a scope element is
/// given and the path never crosses it, the match is out of scope and
/// discarded.
pub fn resolve_list_from_event<L: TileList>(
    dom: &ElementTree,
    lists: &[L],
    scope: Option<ElementId>,
    selectors: &[String],
    path: &[ElementId],
) -> Option<ListId> {
    let mut found = None;
    let mut crossed_scope = scope.is_none();
    for &el in path {
        if Some(el) == scope {
            crossed_scope = true;
        }
        if found.is_none()
            && is_list(dom, el, selectors)
            && let Some(at) = lists.iter().position(|l| l.element() == el)
        {
            found = Some(ListId(at));
        }
    }
    if crossed_scope { found } else { None }
}

/// A layout root rendered directly inside the tile marked with `id`.
pub fn nested_list<L: TileList>(
    dom: &ElementTree,
    lists: &[L],
    id: &TileId,
) -> Option<ListId> {
    lists.iter().position(|l| {
        dom.parent(l.element())
            .and_then(|p| dom.attr(p, TILE_ATTR))
            .map(|v| TileId::from_attr(v) == *id)
            .unwrap_or(false)
    })
    .map(ListId)
}
