//! The editor controller: selection, scope navigation, and the structural
//! commands operating on whatever is currently selected. The controller owns
//! editor state only; the document and its layout roots are passed in as a
//! [`Workspace`] on every call.

use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, warn};

use crate::common::config::{EditorSettings, MediaScreenRange, WidthRange};
use crate::editor::breadcrumb::{Breadcrumb, Crumb};
use crate::editor::locator::{self, TileRef};
use crate::editor::message::MessageBanner;
use crate::editor::namer;
use crate::editor::overlay::{HighlightOverlay, HighlightTarget, Overlay};
use crate::list::{ListId, TileList, Workspace};
use crate::model::dom::{ElementId, ElementTree};
use crate::model::setup::{
    FlowDirection, SetupData, SetupKey, SetupTree, SizeValue, TileId, cmp_priority,
    cmp_priority_desc,
};

/// Offset placing a packed group just above its first member in render order.
const GROUP_EPSILON: f64 = 1e-5;

const CROSS_LIST_MESSAGE: &str = "Cannot select tiles from different tile lists.";

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("tile {0} is not scopable: it has no children and hosts no nested list")]
    NotScopable(TileId),
}

/// A pointer event as delivered by the host: the composed hit path,
/// innermost element first.
#[derive(Clone, Debug)]
pub struct PointerEvent {
    pub path: Vec<ElementId>,
    pub ctrl: bool,
}

impl PointerEvent {
    pub fn at(dom: &ElementTree, target: ElementId, ctrl: bool) -> Self {
        PointerEvent { path: dom.composed_path(target), ctrl }
    }
}

/// Setup fields editable through the common-value interface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SetupField {
    Background,
    Outline,
    Oversize,
    Gutter,
    Width,
    Height,
    WidthFlexible,
    HeightDynamic,
    TightGroup,
    Direction,
    Content,
    Hidden,
}

#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Flag(bool),
    Size(SizeValue),
    Direction(FlowDirection),
    Unset,
}

/// Aggregate of one field over every selection target.
#[derive(Clone, Debug, PartialEq)]
pub enum CommonValue {
    Uniform(FieldValue),
    Mixed,
}

/// Selection and scope controller over a workspace of layout roots.
pub struct SimpleEditor {
    settings: EditorSettings,
    selected_list: Option<ListId>,
    selected_scope: Option<TileId>,
    selected_tiles: Vec<TileRef>,
    scope_items: Vec<TileId>,
    breadcrumb: Breadcrumb,
    message: MessageBanner,
    pub rollover: Overlay,
    pub highlight_selected: Overlay,
    pub highlight_scope: Overlay,
    width: Option<WidthRange>,
    visible: Option<bool>,
    media_screen: Option<MediaScreenRange>,
    has_changes: bool,
    /// Set while selection state is being mirrored into UI fields, so the
    /// mirroring itself never marks the setup dirty.
    syncing_ui: bool,
    bound: Option<ListId>,
    attached: bool,
    pending_init: Option<Instant>,
}

impl SimpleEditor {
    pub fn new(settings: EditorSettings) -> Self {
        let timeout = Duration::from_millis(settings.message_timeout_ms);
        SimpleEditor {
            settings,
            selected_list: None,
            selected_scope: None,
            selected_tiles: Vec::new(),
            scope_items: Vec::new(),
            breadcrumb: Breadcrumb::default(),
            message: MessageBanner::new(timeout),
            rollover: Overlay::default(),
            highlight_selected: Overlay::default(),
            highlight_scope: Overlay::default(),
            width: None,
            visible: None,
            media_screen: None,
            has_changes: false,
            syncing_ui: false,
            bound: None,
            attached: false,
            pending_init: None,
        }
    }

    /// Attaches the editor to the document. The first selection reset is
    /// deferred so the surrounding lists finish rendering first; it fires
    /// from [`SimpleEditor::tick`].
    pub fn attach(&mut self, now: Instant) {
        self.attached = true;
        self.pending_init = Some(now + Duration::from_millis(self.settings.init_delay_ms));
    }

    pub fn detach(&mut self) {
        self.attached = false;
        self.bound = None;
        self.pending_init = None;
        self.rollover.hide();
        self.highlight_selected.hide();
        self.highlight_scope.hide();
    }

    pub fn is_attached(&self) -> bool { self.attached }

    /// Drives deferred work: message expiry and the delayed initial reset.
    pub fn tick<L: TileList>(&mut self, ws: &Workspace<L>, now: Instant) {
        self.message.tick(now);
        if let Some(deadline) = self.pending_init
            && now >= deadline
        {
            self.pending_init = None;
            self.reset_selection(ws);
        }
    }

    /// Returns to the baseline state: the sole top-level list selected when
    /// there is exactly one, nothing otherwise. Clears selection, scope, and
    /// the breadcrumb.
    pub fn reset_selection<L: TileList>(&mut self, ws: &Workspace<L>) {
        let tops = ws.top_level_lists();
        self.selected_list = if tops.len() == 1 { Some(tops[0]) } else { None };
        self.selected_scope = None;
        self.selected_tiles.clear();
        self.breadcrumb.clear();
        self.bind_list();
        self.read_media_screen(ws);
        self.selection_changed(ws);
        self.refresh_scope_items(ws);
        self.refresh_scope_highlight(ws);
    }

    // --- pointer handling ---

    pub fn pointer_move<L: TileList>(&mut self, ws: &Workspace<L>, ev: &PointerEvent) {
        let Some(lid) = self.selected_list else {
            self.rollover.hide();
            return;
        };
        let hit = locator::resolve_tile_from_event(
            &ws.dom,
            ws.list(lid),
            self.selected_scope.as_ref(),
            &ev.path,
        );
        match hit {
            Some(tile) => self.rollover.show(tile.highlight_target()),
            None => self.rollover.hide(),
        }
    }

    pub fn pointer_leave(&mut self) { self.rollover.hide() }

    pub fn pointer_click<L: TileList>(
        &mut self,
        ws: &Workspace<L>,
        ev: &PointerEvent,
        now: Instant,
    ) {
        let hit = self.hit_tile(ws, ev);
        self.toggle_selected_tile(ws, ev.ctrl, hit, now);
    }

    /// Double-click scopes into the hit tile when it is scopable; anything
    /// else is ignored.
    pub fn pointer_double_click<L: TileList>(
        &mut self,
        ws: &Workspace<L>,
        ev: &PointerEvent,
    ) -> Result<(), EditorError> {
        let Some(lid) = self.selected_list else { return Ok(()) };
        let Some(tile) = locator::resolve_tile_from_event(
            &ws.dom,
            ws.list(lid),
            self.selected_scope.as_ref(),
            &ev.path,
        ) else {
            return Ok(());
        };
        let Some(key) = ws.list(lid).setup().find(tile.id()) else { return Ok(()) };
        if self.is_scopable(ws, lid, key) {
            self.scope_in(ws, key)
        } else {
            Ok(())
        }
    }

    fn hit_tile<L: TileList>(
        &self,
        ws: &Workspace<L>,
        ev: &PointerEvent,
    ) -> Option<(ListId, TileRef)> {
        // The selected list resolves first, honoring the scope.
        if let Some(lid) = self.selected_list
            && let Some(tile) = locator::resolve_tile_from_event(
                &ws.dom,
                ws.list(lid),
                self.selected_scope.as_ref(),
                &ev.path,
            )
        {
            return Some((lid, tile));
        }
        // Otherwise the innermost layout root along the path. While scoped,
        // roots outside the scope element do not count as hits.
        let scope_el = match (self.selected_list, &self.selected_scope) {
            (Some(lid), Some(id)) => ws.list(lid).tile(id),
            _ => None,
        };
        let other = locator::resolve_list_from_event(
            &ws.dom,
            &ws.lists,
            scope_el,
            &self.settings.list_selectors,
            &ev.path,
        )?;
        if Some(other) == self.selected_list {
            return None;
        }
        let tile = locator::resolve_tile_from_event(&ws.dom, ws.list(other), None, &ev.path)?;
        Some((other, tile))
    }

    /// Core selection transition. `hit` is the resolved tile, if any; a miss
    /// scopes out when scoped and resets otherwise. Plain selection replaces
    /// the set; `multiple` toggles membership, rejecting cross-list mixes
    /// with a transient message and no state change.
    pub fn toggle_selected_tile<L: TileList>(
        &mut self,
        ws: &Workspace<L>,
        multiple: bool,
        hit: Option<(ListId, TileRef)>,
        now: Instant,
    ) {
        let Some((list, tile)) = hit else {
            if self.breadcrumb.is_empty() {
                self.reset_selection(ws);
            } else {
                self.scope_out(ws);
            }
            return;
        };

        if !multiple {
            if Some(list) != self.selected_list {
                self.switch_list(ws, list);
            }
            self.selected_tiles = vec![tile];
            self.selection_changed(ws);
            return;
        }

        if Some(list) != self.selected_list {
            if !self.selected_tiles.is_empty() {
                debug!(%list, "rejecting cross-list multi-select");
                self.show_message(CROSS_LIST_MESSAGE, now);
                return;
            }
            self.switch_list(ws, list);
        }
        match self.selected_tiles.iter().position(|t| t.id() == tile.id()) {
            Some(at) => {
                self.selected_tiles.remove(at);
            }
            None => self.selected_tiles.push(tile),
        }
        self.selection_changed(ws);
    }

    /// Selecting into another root starts a fresh navigation context.
    fn switch_list<L: TileList>(&mut self, ws: &Workspace<L>, list: ListId) {
        debug!(%list, "switching selected list");
        self.selected_list = Some(list);
        self.selected_scope = None;
        self.breadcrumb.clear();
        self.bind_list();
        self.read_media_screen(ws);
        self.refresh_scope_items(ws);
        self.refresh_scope_highlight(ws);
    }

    fn bind_list(&mut self) { self.bound = self.selected_list }

    /// The list whose events the host should currently route here.
    pub fn bound_list(&self) -> Option<ListId> { self.bound }

    // --- scope navigation ---

    /// A tile can be scoped into when it is a group with children, or when
    /// it hosts a nested layout root.
    pub fn is_scopable<L: TileList>(&self, ws: &Workspace<L>, list: ListId, key: SetupKey) -> bool {
        let tree = ws.list(list).setup();
        if tree.is_group(key) && !tree.children(key).is_empty() {
            return true;
        }
        locator::nested_list(&ws.dom, &ws.lists, tree.id(key)).is_some()
    }

    /// Descends into `key`: a group becomes the new scope; a tile hosting a
    /// nested root switches to that root. The departing context is pushed on
    /// the breadcrumb and the selection is cleared.
    pub fn scope_in<L: TileList>(
        &mut self,
        ws: &Workspace<L>,
        key: SetupKey,
    ) -> Result<(), EditorError> {
        let Some(lid) = self.selected_list else { return Ok(()) };
        let tree = ws.list(lid).setup();
        let target_id = tree.id(key).clone();
        let group_with_children = tree.is_group(key) && !tree.children(key).is_empty();
        let nested = locator::nested_list(&ws.dom, &ws.lists, &target_id);

        let name = self.context_label(ws);
        match (group_with_children, nested) {
            (true, _) => {
                debug!(%lid, id = %target_id, "scoping into group");
                self.breadcrumb.push(Crumb {
                    list: lid,
                    scope: self.selected_scope.take(),
                    name,
                });
                self.selected_scope = Some(target_id);
            }
            (false, Some(nested)) => {
                debug!(%lid, id = %target_id, %nested, "scoping into nested list");
                self.breadcrumb.push(Crumb {
                    list: lid,
                    scope: self.selected_scope.take(),
                    name,
                });
                self.selected_list = Some(nested);
                self.bind_list();
                self.read_media_screen(ws);
            }
            (false, None) => return Err(EditorError::NotScopable(target_id)),
        }
        self.selected_tiles.clear();
        self.selection_changed(ws);
        self.refresh_scope_items(ws);
        self.refresh_scope_highlight(ws);
        Ok(())
    }

    /// Pops one breadcrumb entry and restores that context. With an empty
    /// breadcrumb this is a full reset.
    pub fn scope_out<L: TileList>(&mut self, ws: &Workspace<L>) {
        let Some(crumb) = self.breadcrumb.pop() else {
            self.reset_selection(ws);
            return;
        };
        debug!(list = %crumb.list, "scoping out");
        self.restore_context(ws, crumb);
    }

    /// Jumps to the breadcrumb entry at `index`, dropping it and everything
    /// deeper.
    pub fn scope_to<L: TileList>(&mut self, ws: &Workspace<L>, index: usize) {
        let Some(crumb) = self.breadcrumb.truncate_through(index) else { return };
        debug!(list = %crumb.list, index, "scoping to breadcrumb entry");
        self.selected_tiles.clear();
        self.restore_context(ws, crumb);
    }

    fn restore_context<L: TileList>(&mut self, ws: &Workspace<L>, crumb: Crumb) {
        self.selected_list = Some(crumb.list);
        self.selected_scope = crumb.scope;
        self.bind_list();
        self.repair_scope(ws);
        self.resync_selection(ws);
        self.selection_changed(ws);
        self.read_media_screen(ws);
        self.refresh_scope_items(ws);
        self.refresh_scope_highlight(ws);
    }

    /// Label of the current context, used when pushing it on the breadcrumb.
    fn context_label<L: TileList>(&self, ws: &Workspace<L>) -> String {
        let Some(lid) = self.selected_list else { return String::new() };
        match self
            .selected_scope
            .as_ref()
            .and_then(|id| ws.list(lid).setup().find(id))
        {
            Some(scope) => namer::setup_label(&namer::display_name(ws, lid, scope)),
            None => namer::list_label(ws, lid),
        }
    }

    // --- common property values ---

    /// Reads `field` across every selection target: the selected tiles, or
    /// the scope when nothing is selected, or the root when unscoped.
    pub fn get_common_value<L: TileList>(
        &self,
        ws: &Workspace<L>,
        field: SetupField,
    ) -> Option<CommonValue> {
        let lid = self.selected_list?;
        let tree = ws.list(lid).setup();
        let mut value: Option<FieldValue> = None;
        for key in self.target_keys(tree) {
            let v = get_field(tree.data(key), field);
            match &value {
                None => value = Some(v),
                Some(prev) if *prev != v => return Some(CommonValue::Mixed),
                Some(_) => {}
            }
        }
        value.map(CommonValue::Uniform)
    }

    /// Writes `field` on every selection target and refreshes. Visibility is
    /// the one field needing a hard refresh, since hidden tiles are not
    /// rendered at all.
    pub fn set_common_value<L: TileList>(
        &mut self,
        ws: &mut Workspace<L>,
        field: SetupField,
        value: FieldValue,
    ) {
        let Some(lid) = self.selected_list else { return };
        self.touch();
        {
            let Workspace { dom, lists } = &mut *ws;
            let list = &mut lists[lid.0];
            let keys = self.target_keys(list.setup());
            for key in keys {
                set_field(list.setup_mut().data_mut(key), field, value.clone());
            }
            let hard = field == SetupField::Hidden;
            list.refresh(dom, hard);
        }
        self.resync_selection(ws);
        self.selection_changed(ws);
    }

    fn target_keys(&self, tree: &SetupTree) -> Vec<SetupKey> {
        if !self.selected_tiles.is_empty() {
            self.selected_tiles.iter().filter_map(|t| tree.find(t.id())).collect()
        } else if let Some(scope) = &self.selected_scope {
            tree.find(scope).into_iter().collect()
        } else {
            vec![tree.root()]
        }
    }

    // --- width, visibility, media screen mirrors ---

    pub fn width(&self) -> Option<&WidthRange> { self.width.as_ref() }

    pub fn visible(&self) -> Option<bool> { self.visible }

    pub fn media_screen(&self) -> Option<&MediaScreenRange> { self.media_screen.as_ref() }

    /// Applies a width range to the selection; the width also becomes
    /// flexible, so percentages can actually stretch.
    pub fn select_width<L: TileList>(&mut self, ws: &mut Workspace<L>, range: &WidthRange) {
        let Some(lid) = self.selected_list else { return };
        self.touch();
        self.width = Some(range.clone());
        {
            let Workspace { dom, lists } = &mut *ws;
            let list = &mut lists[lid.0];
            let keys: Vec<SetupKey> = self
                .selected_tiles
                .iter()
                .filter_map(|t| list.setup().find(t.id()))
                .collect();
            for key in keys {
                let data = list.setup_mut().data_mut(key);
                data.width = Some(SizeValue::Text(range.value.clone()));
                data.width_flexible = true;
            }
            list.refresh(dom, false);
        }
        self.resync_selection(ws);
    }

    pub fn select_visible<L: TileList>(&mut self, ws: &mut Workspace<L>, visible: bool) {
        let Some(lid) = self.selected_list else { return };
        self.touch();
        self.visible = Some(visible);
        {
            let Workspace { dom, lists } = &mut *ws;
            let list = &mut lists[lid.0];
            let keys: Vec<SetupKey> = self
                .selected_tiles
                .iter()
                .filter_map(|t| list.setup().find(t.id()))
                .collect();
            for key in keys {
                list.setup_mut().data_mut(key).hidden = !visible;
            }
            list.refresh(dom, true);
        }
        self.resync_selection(ws);
        self.selection_changed(ws);
    }

    /// Sets the selected list's root width to the range's pixel width.
    pub fn select_media_screen<L: TileList>(
        &mut self,
        ws: &mut Workspace<L>,
        range: &MediaScreenRange,
    ) {
        let Some(lid) = self.selected_list else { return };
        self.touch();
        self.media_screen = Some(range.clone());
        {
            let Workspace { dom, lists } = &mut *ws;
            let list = &mut lists[lid.0];
            let root = list.setup().root();
            list.setup_mut().data_mut(root).width = Some(SizeValue::Pixels(range.width));
            list.refresh(dom, false);
        }
    }

    fn read_width<L: TileList>(&mut self, ws: &Workspace<L>) {
        let found = match self.get_common_value(ws, SetupField::Width) {
            Some(CommonValue::Uniform(FieldValue::Size(SizeValue::Text(value)))) => {
                self.settings.width_ranges.iter().find(|r| r.value == value).cloned()
            }
            _ => None,
        };
        self.width = found;
    }

    fn read_visible<L: TileList>(&mut self, ws: &Workspace<L>) {
        self.visible = match self.get_common_value(ws, SetupField::Hidden) {
            Some(CommonValue::Uniform(FieldValue::Flag(hidden))) => Some(!hidden),
            _ => None,
        };
    }

    /// The widest configured screen range not exceeding the root width.
    fn read_media_screen<L: TileList>(&mut self, ws: &Workspace<L>) {
        let found = self.selected_list.and_then(|lid| {
            let tree = ws.list(lid).setup();
            match tree.data(tree.root()).width {
                Some(SizeValue::Pixels(width)) => self
                    .settings
                    .media_screen_ranges
                    .iter()
                    .filter(|r| r.width <= width)
                    .next_back()
                    .cloned(),
                _ => None,
            }
        });
        self.media_screen = found;
    }

    // --- structural commands ---

    /// Moves every selected tile one slot toward the front of its siblings.
    /// Processing in descending priority order keeps a block of selected
    /// neighbors from leapfrogging each other.
    pub fn move_up<L: TileList>(&mut self, ws: &mut Workspace<L>) {
        self.reprioritize_selection(ws, true);
    }

    /// Moves every selected tile one slot toward the back, processing in
    /// ascending priority order.
    pub fn move_down<L: TileList>(&mut self, ws: &mut Workspace<L>) {
        self.reprioritize_selection(ws, false);
    }

    fn reprioritize_selection<L: TileList>(&mut self, ws: &mut Workspace<L>, up: bool) {
        let Some(lid) = self.selected_list else { return };
        self.touch();
        {
            let Workspace { dom, lists } = &mut *ws;
            let list = &mut lists[lid.0];
            let mut keys: Vec<SetupKey> = self
                .selected_tiles
                .iter()
                .filter_map(|t| list.setup().find(t.id()))
                .collect();
            keys.sort_by(|&a, &b| {
                let (pa, pb) = (list.setup().data(a).priority, list.setup().data(b).priority);
                if up { cmp_priority_desc(pa, pb) } else { cmp_priority(pa, pb) }
            });
            for key in keys {
                if !list.reprioritize_item(key, up) {
                    debug!(%lid, "tile already at boundary");
                }
            }
            list.refresh(dom, false);
        }
        self.resync_selection(ws);
        self.selection_changed(ws);
        self.refresh_scope_items(ws);
    }

    /// Packs the selected tiles into a fresh tight group next to the first
    /// selected tile, and selects the new group.
    pub fn pack_group<L: TileList>(&mut self, ws: &mut Workspace<L>) {
        self.create_group(ws, true, false);
    }

    /// Creates an empty tight group at the top of the current scope.
    pub fn pack_empty_group<L: TileList>(&mut self, ws: &mut Workspace<L>) {
        self.create_group(ws, false, false);
    }

    /// Creates a full-width separator group at the top of the current scope.
    pub fn pack_separator_group<L: TileList>(&mut self, ws: &mut Workspace<L>) {
        self.create_group(ws, false, true);
    }

    fn create_group<L: TileList>(&mut self, ws: &mut Workspace<L>, pack: bool, separator: bool) {
        let Some(lid) = self.selected_list else { return };
        self.touch();
        let group_id;
        {
            let Workspace { dom, lists } = &mut *ws;
            let list = &mut lists[lid.0];
            let scope_key =
                self.selected_scope.as_ref().and_then(|id| list.setup().find(id));
            let first_key = pack
                .then(|| self.selected_tiles.first())
                .flatten()
                .and_then(|t| list.setup().find(t.id()));

            let (parent, priority) = match first_key {
                // Next to the first selected tile, just above it in order.
                Some(key) => {
                    let tree = list.setup();
                    let parent = tree.parent(key).unwrap_or(tree.root());
                    (parent, tree.data(key).priority - GROUP_EPSILON)
                }
                // No anchor: the group goes to the top of the scope. The
                // current top item steps aside so priorities stay distinct.
                None => {
                    let container = scope_key.unwrap_or(list.setup().root());
                    let top = list.setup().children_by_priority(container, true).first().copied();
                    if let Some(top) = top {
                        list.setup_mut().data_mut(top).priority = 1.0 - GROUP_EPSILON;
                    }
                    (container, 1.0)
                }
            };

            let fields = SetupData {
                priority,
                width: Some(SizeValue::percent(100)),
                width_flexible: true,
                height: Some(SizeValue::Pixels(1.0)),
                height_dynamic: !separator,
                tight_group: true,
                background: separator.then(|| "#ffffff".to_owned()),
                ..Default::default()
            };
            let group = list.create_new_container(None, Some(parent), fields, true);

            if pack {
                // Priority order inside the group stays as it was among the
                // siblings, so the members keep their relative placement.
                let mut members: Vec<SetupKey> = self
                    .selected_tiles
                    .iter()
                    .filter_map(|t| list.setup().find(t.id()))
                    .collect();
                members.sort_by(|&a, &b| {
                    cmp_priority_desc(list.setup().data(a).priority, list.setup().data(b).priority)
                });
                for member in members {
                    list.move_to_container(member, group, false);
                }
            }
            group_id = list.setup().id(group).clone();
            debug!(%lid, id = %group_id, pack, separator, "created group");
            list.refresh(dom, true);
        }

        let list = ws.list(lid);
        self.selected_tiles = list
            .setup()
            .find(&group_id)
            .and_then(|key| locator::tile_ref_for(list, key))
            .into_iter()
            .collect();
        self.selection_changed(ws);
        self.refresh_scope_items(ws);
    }

    /// Dissolves every selected group, merging members back into the
    /// group's parent. Non-group tiles in the selection are left alone.
    pub fn unpack_group<L: TileList>(&mut self, ws: &mut Workspace<L>) {
        let Some(lid) = self.selected_list else { return };
        self.touch();
        {
            let Workspace { dom, lists } = &mut *ws;
            let list = &mut lists[lid.0];
            let snapshot: Vec<TileId> =
                self.selected_tiles.iter().map(|t| t.id().clone()).collect();
            let mut removed = Vec::new();
            for id in snapshot {
                if let Some(key) = list.setup().find(&id)
                    && list.setup().is_group(key)
                {
                    debug!(%lid, %id, "unpacking group");
                    list.delete_container(key);
                    removed.push(id);
                }
            }
            self.selected_tiles.retain(|t| !removed.contains(t.id()));
            list.refresh(dom, true);
        }
        self.repair_scope(ws);
        self.resync_selection(ws);
        self.selection_changed(ws);
        self.refresh_scope_items(ws);
    }

    // --- persistence ---

    /// Writes every list's setup to its sync collaborator.
    pub fn save_setup<L: TileList>(&mut self, ws: &mut Workspace<L>) {
        for list in &mut ws.lists {
            let values = list.setup().to_values();
            if let Some(sync) = list.sync() {
                sync.save(&values);
            }
        }
        self.has_changes = false;
    }

    /// Restores every list to its default setup. All setups are replaced
    /// first and only then refreshed, since a nested list changing its
    /// dimensions affects its parent's layout.
    pub fn reset_setup<L: TileList>(&mut self, ws: &mut Workspace<L>) {
        self.touch();
        for list in &mut ws.lists {
            if let Some(values) = list.default_setup().cloned()
                && let Err(err) = list.replace_setup(&values)
            {
                warn!(%err, "default setup rejected");
            }
        }
        self.refresh_all_hard(ws);
        self.after_setup_replaced(ws);
    }

    /// Rolls every list back to its last stored setup.
    pub fn revert_setup<L: TileList>(&mut self, ws: &mut Workspace<L>) {
        for list in &mut ws.lists {
            let stored = list.sync().and_then(|sync| sync.revert());
            if let Some(values) = stored
                && let Err(err) = list.replace_setup(&values)
            {
                warn!(%err, "stored setup rejected");
            }
        }
        self.refresh_all_hard(ws);
        self.selected_tiles.clear();
        self.after_setup_replaced(ws);
        self.has_changes = false;
    }

    fn refresh_all_hard<L: TileList>(&mut self, ws: &mut Workspace<L>) {
        let Workspace { dom, lists } = &mut *ws;
        for list in lists.iter_mut() {
            list.refresh(dom, true);
        }
    }

    /// Replacing setups invalidates every key; everything id-based is
    /// re-resolved, anything that vanished is dropped.
    fn after_setup_replaced<L: TileList>(&mut self, ws: &Workspace<L>) {
        self.repair_scope(ws);
        self.resync_selection(ws);
        self.selection_changed(ws);
        self.read_media_screen(ws);
        self.refresh_scope_items(ws);
        self.refresh_scope_highlight(ws);
    }

    // --- messages and dirty tracking ---

    pub fn show_message(&mut self, text: &str, now: Instant) {
        debug!(text, "showing message");
        self.message.show(text, now);
    }

    pub fn message(&self) -> &MessageBanner { &self.message }

    /// Marks the setup dirty, unless state is merely being mirrored into
    /// the UI.
    pub fn touch(&mut self) {
        if !self.syncing_ui {
            self.has_changes = true;
        }
    }

    pub fn has_changes(&self) -> bool { self.has_changes }

    // --- internal state upkeep ---

    fn selection_changed<L: TileList>(&mut self, ws: &Workspace<L>) {
        if self.selected_tiles.is_empty() {
            self.highlight_selected.hide();
            self.width = None;
            self.visible = None;
            return;
        }
        let target = if let [only] = self.selected_tiles.as_slice() {
            only.highlight_target()
        } else {
            HighlightTarget::Elements(
                self.selected_tiles.iter().flat_map(|t| t.elements()).collect(),
            )
        };
        self.highlight_selected.show(target);
        self.read_selected_setup(ws);
    }

    fn read_selected_setup<L: TileList>(&mut self, ws: &Workspace<L>) {
        self.syncing_ui = true;
        self.read_width(ws);
        self.read_visible(ws);
        self.syncing_ui = false;
    }

    /// Rebuilds the selected tile references by id after a refresh or a
    /// structural change. Tiles that no longer exist fall out.
    fn resync_selection<L: TileList>(&mut self, ws: &Workspace<L>) {
        let Some(lid) = self.selected_list else {
            self.selected_tiles.clear();
            return;
        };
        let list = ws.list(lid);
        let mut fresh = Vec::with_capacity(self.selected_tiles.len());
        for tile in &self.selected_tiles {
            match list.setup().find(tile.id()).and_then(|key| locator::tile_ref_for(list, key)) {
                Some(resolved) => fresh.push(resolved),
                None => debug!(%lid, id = %tile.id(), "selected tile vanished"),
            }
        }
        self.selected_tiles = fresh;
    }

    /// Drops a scope whose id no longer resolves in the selected list.
    fn repair_scope<L: TileList>(&mut self, ws: &Workspace<L>) {
        if self.selected_list.is_some_and(|lid| lid.0 >= ws.lists.len()) {
            self.selected_list = None;
            self.selected_scope = None;
            return;
        }
        if let Some(lid) = self.selected_list
            && let Some(id) = &self.selected_scope
            && ws.list(lid).setup().find(id).is_none()
        {
            debug!(%lid, %id, "scope vanished, falling back to root");
            self.selected_scope = None;
        }
    }

    /// Recomputes the scope item listing: the children of the scope (or the
    /// root) in rendering order.
    fn refresh_scope_items<L: TileList>(&mut self, ws: &Workspace<L>) {
        self.scope_items = match self.selected_list {
            Some(lid) => {
                let tree = ws.list(lid).setup();
                let base = self
                    .selected_scope
                    .as_ref()
                    .and_then(|id| tree.find(id))
                    .unwrap_or(tree.root());
                tree.children_by_priority(base, true)
                    .iter()
                    .map(|&key| tree.id(key).clone())
                    .collect()
            }
            None => Vec::new(),
        };
    }

    fn refresh_scope_highlight<L: TileList>(&mut self, ws: &Workspace<L>) {
        let Some(lid) = self.selected_list else {
            self.highlight_scope.hide();
            return;
        };
        let Some(scope_id) = &self.selected_scope else {
            self.highlight_scope.show(HighlightTarget::Element(ws.list(lid).element()));
            return;
        };
        let list = ws.list(lid);
        if let Some(el) = list.tile(scope_id) {
            self.highlight_scope.show(HighlightTarget::Element(el));
        } else if let Some(key) = list.setup().find(scope_id)
            && let Some(TileRef::LooseGroup { elements, .. }) = locator::tile_ref_for(list, key)
        {
            // A loose scope has no element of its own; outline its members.
            self.highlight_scope.show(HighlightTarget::Elements(elements));
        } else {
            self.highlight_scope.hide();
        }
    }

    // --- accessors ---

    pub fn settings(&self) -> &EditorSettings { &self.settings }

    pub fn selected_list(&self) -> Option<ListId> { self.selected_list }

    pub fn selected_scope(&self) -> Option<&TileId> { self.selected_scope.as_ref() }

    pub fn selected_tiles(&self) -> &[TileRef] { &self.selected_tiles }

    /// Ids of the current scope's children in rendering order.
    pub fn scope_items(&self) -> &[TileId] { &self.scope_items }

    pub fn breadcrumb(&self) -> &Breadcrumb { &self.breadcrumb }
}

fn get_field(data: &SetupData, field: SetupField) -> FieldValue {
    use FieldValue as V;
    use SetupField as F;
    match field {
        F::Background => data.background.clone().map(V::Text).unwrap_or(V::Unset),
        F::Outline => data.outline.clone().map(V::Text).unwrap_or(V::Unset),
        F::Oversize => data.oversize.map(V::Number).unwrap_or(V::Unset),
        F::Gutter => data.gutter.map(V::Number).unwrap_or(V::Unset),
        F::Width => data.width.clone().map(V::Size).unwrap_or(V::Unset),
        F::Height => data.height.clone().map(V::Size).unwrap_or(V::Unset),
        F::WidthFlexible => V::Flag(data.width_flexible),
        F::HeightDynamic => V::Flag(data.height_dynamic),
        F::TightGroup => V::Flag(data.tight_group),
        F::Direction => data.direction.map(V::Direction).unwrap_or(V::Unset),
        F::Content => data.content.clone().map(V::Text).unwrap_or(V::Unset),
        F::Hidden => V::Flag(data.hidden),
    }
}

fn set_field(data: &mut SetupData, field: SetupField, value: FieldValue) {
    use FieldValue as V;
    use SetupField as F;
    match (field, value) {
        (F::Background, V::Text(s)) => data.background = Some(s),
        (F::Background, V::Unset) => data.background = None,
        (F::Outline, V::Text(s)) => data.outline = Some(s),
        (F::Outline, V::Unset) => data.outline = None,
        (F::Oversize, V::Number(n)) => data.oversize = Some(n),
        (F::Oversize, V::Unset) => data.oversize = None,
        (F::Gutter, V::Number(n)) => data.gutter = Some(n),
        (F::Gutter, V::Unset) => data.gutter = None,
        (F::Width, V::Size(s)) => data.width = Some(s),
        (F::Width, V::Unset) => data.width = None,
        (F::Height, V::Size(s)) => data.height = Some(s),
        (F::Height, V::Unset) => data.height = None,
        (F::WidthFlexible, V::Flag(b)) => data.width_flexible = b,
        (F::HeightDynamic, V::Flag(b)) => data.height_dynamic = b,
        (F::TightGroup, V::Flag(b)) => data.tight_group = b,
        (F::Direction, V::Direction(d)) => data.direction = Some(d),
        (F::Direction, V::Unset) => data.direction = None,
        (F::Content, V::Text(s)) => data.content = Some(s),
        (F::Content, V::Unset) => data.content = None,
        (F::Hidden, V::Flag(b)) => data.hidden = b,
        (field, value) => warn!(?field, ?value, "mismatched value for setup field"),
    }
}
