//! Board view-model: notes and note-links merged into a draggable node graph.
//!
//! Everything here is plain state-machine logic with no DOM or network
//! dependency; the page layer owns persistence and feeds the outcomes back
//! in (`link_created` / `link_create_failed` / `remove_link`).

use crate::models::{Note, NoteLink};

pub(crate) const GRID_COLS: usize = 4;
pub(crate) const GRID_ORIGIN_X: f64 = 100.0;
pub(crate) const GRID_ORIGIN_Y: f64 = 100.0;
pub(crate) const GRID_STEP_X: f64 = 250.0;
pub(crate) const GRID_STEP_Y: f64 = 200.0;

/// Rendered node footprint; edges attach to node centers.
pub(crate) const NODE_WIDTH: f64 = 160.0;
pub(crate) const NODE_HEIGHT: f64 = 120.0;

pub(crate) const PALETTE: [&str; 6] = [
    "#06b6d4", "#8b5cf6", "#f59e0b", "#10b981", "#ef4444", "#3b82f6",
];

/// Initial grid slot for the note at `index` in backend order. Positions are
/// assigned once per load and afterwards move only by drag.
pub(crate) fn grid_position(index: usize) -> (f64, f64) {
    let col = (index % GRID_COLS) as f64;
    let row = (index / GRID_COLS) as f64;
    (
        GRID_ORIGIN_X + col * GRID_STEP_X,
        GRID_ORIGIN_Y + row * GRID_STEP_Y,
    )
}

pub(crate) fn palette_color(index: usize) -> &'static str {
    PALETTE[index % PALETTE.len()]
}

/// A note with its ephemeral screen-layout fields. Never persisted.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct BoardNode {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub x: f64,
    pub y: f64,
    pub color: &'static str,
}

impl BoardNode {
    pub fn center(&self) -> (f64, f64) {
        (self.x + NODE_WIDTH / 2.0, self.y + NODE_HEIGHT / 2.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Drag {
    node_id: i64,
    offset_x: f64,
    offset_y: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum LinkingState {
    Off,
    Armed { source: Option<i64> },
}

/// What a node click means in the current linking state. `CreateLink` is an
/// intent; the caller performs the request and reports back.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ClickOutcome {
    Ignored,
    SourceArmed(i64),
    SourceCleared,
    CreateLink { source: i64, target: i64 },
}

#[derive(Clone, Debug)]
pub(crate) struct BoardModel {
    nodes: Vec<BoardNode>,
    links: Vec<NoteLink>,
    drag: Option<Drag>,
    linking: LinkingState,
}

impl BoardModel {
    /// Build the graph from a loaded note list (in backend order) and link
    /// list. Notes the server has not assigned an id yet cannot appear here.
    pub fn new(notes: &[Note], links: Vec<NoteLink>) -> Self {
        let nodes = notes
            .iter()
            .filter_map(|n| n.id.map(|id| (id, n)))
            .enumerate()
            .map(|(i, (id, n))| {
                let (x, y) = grid_position(i);
                BoardNode {
                    id,
                    title: n.title.clone(),
                    content: n.content.clone(),
                    x,
                    y,
                    color: palette_color(i),
                }
            })
            .collect();

        Self {
            nodes,
            links,
            drag: None,
            linking: LinkingState::Off,
        }
    }

    pub fn nodes(&self) -> &[BoardNode] {
        &self.nodes
    }

    pub fn links(&self) -> &[NoteLink] {
        &self.links
    }

    pub fn node(&self, id: i64) -> Option<&BoardNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    // ---- drag gesture: Idle -> Dragging -> Idle ----

    /// Mouse-down on a node. Starts a drag only while linking mode is off;
    /// the offset between pointer and node origin is captured so the node
    /// does not jump under the cursor.
    pub fn pointer_down(&mut self, node_id: i64, pointer_x: f64, pointer_y: f64) -> bool {
        if self.linking != LinkingState::Off {
            return false;
        }
        let Some(node) = self.node(node_id) else {
            return false;
        };
        self.drag = Some(Drag {
            node_id,
            offset_x: pointer_x - node.x,
            offset_y: pointer_y - node.y,
        });
        true
    }

    pub fn pointer_move(&mut self, pointer_x: f64, pointer_y: f64) {
        let Some(drag) = self.drag else { return };
        if let Some(node) = self.nodes.iter_mut().find(|n| n.id == drag.node_id) {
            node.x = pointer_x - drag.offset_x;
            node.y = pointer_y - drag.offset_y;
        }
    }

    /// Mouse-up or pointer-leave. Positions stay where the drag left them;
    /// nothing is persisted.
    pub fn pointer_up(&mut self) {
        self.drag = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    // ---- linking sub-machine: Off -> Armed(None) -> Armed(Some) -> Off ----

    pub fn toggle_linking(&mut self) {
        self.linking = match self.linking {
            LinkingState::Off => LinkingState::Armed { source: None },
            LinkingState::Armed { .. } => LinkingState::Off,
        };
        // Arming cancels any in-flight drag.
        self.drag = None;
    }

    pub fn is_linking(&self) -> bool {
        self.linking != LinkingState::Off
    }

    pub fn link_source(&self) -> Option<i64> {
        match self.linking {
            LinkingState::Armed { source } => source,
            LinkingState::Off => None,
        }
    }

    pub fn click_node(&mut self, node_id: i64) -> ClickOutcome {
        if self.node(node_id).is_none() {
            return ClickOutcome::Ignored;
        }
        match self.linking {
            LinkingState::Off => ClickOutcome::Ignored,
            LinkingState::Armed { source: None } => {
                self.linking = LinkingState::Armed {
                    source: Some(node_id),
                };
                ClickOutcome::SourceArmed(node_id)
            }
            LinkingState::Armed { source: Some(s) } if s == node_id => {
                self.linking = LinkingState::Armed { source: None };
                ClickOutcome::SourceCleared
            }
            LinkingState::Armed { source: Some(s) } => ClickOutcome::CreateLink {
                source: s,
                target: node_id,
            },
        }
    }

    /// Backend accepted the link: append it and leave linking mode entirely.
    pub fn link_created(&mut self, link: NoteLink) {
        self.links.push(link);
        self.linking = LinkingState::Off;
    }

    /// Backend rejected the link (conflict or otherwise): stay armed but
    /// clear the source so the user starts the pair over.
    pub fn link_create_failed(&mut self) {
        self.linking = LinkingState::Armed { source: None };
    }

    /// Remove a link from local state. Called only after backend delete
    /// success; local state never diverges from the backend.
    pub fn remove_link(&mut self, link_id: i64) {
        self.links.retain(|l| l.id != link_id);
    }

    // ---- edge geometry ----

    pub fn edge_endpoints(&self, link: &NoteLink) -> Option<((f64, f64), (f64, f64))> {
        let source = self.node(link.source_note_id)?;
        let target = self.node(link.target_note_id)?;
        Some((source.center(), target.center()))
    }

    /// Midpoint of the edge, where the delete affordance is rendered.
    pub fn edge_midpoint(&self, link: &NoteLink) -> Option<(f64, f64)> {
        let ((x1, y1), (x2, y2)) = self.edge_endpoints(link)?;
        Some(((x1 + x2) / 2.0, (y1 + y2) / 2.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(id: i64) -> Note {
        Note {
            id: Some(id),
            title: format!("note {id}"),
            content: String::new(),
            created_at: None,
            updated_at: None,
        }
    }

    fn link(id: i64, source: i64, target: i64) -> NoteLink {
        NoteLink {
            id,
            source_note_id: source,
            target_note_id: target,
            created_at: "2025-01-01T00:00:00".to_string(),
        }
    }

    fn board(n: i64) -> BoardModel {
        let notes: Vec<Note> = (1..=n).map(note).collect();
        BoardModel::new(&notes, vec![])
    }

    #[test]
    fn layout_is_deterministic_grid() {
        let b = board(9);
        for (i, node) in b.nodes().iter().enumerate() {
            let (x, y) = grid_position(i);
            assert_eq!((node.x, node.y), (x, y));
        }
        // index 4 wraps to column 0, row 1
        assert_eq!(grid_position(4), (100.0, 300.0));
        assert_eq!(grid_position(7), (850.0, 300.0));
    }

    #[test]
    fn fifth_note_wraps_to_second_row() {
        let b = board(5);
        let fifth = &b.nodes()[4];
        assert_eq!((fifth.x, fifth.y), (100.0, 300.0));
    }

    #[test]
    fn colors_cycle_through_palette() {
        let b = board(8);
        assert_eq!(b.nodes()[0].color, PALETTE[0]);
        assert_eq!(b.nodes()[5].color, PALETTE[5]);
        assert_eq!(b.nodes()[6].color, PALETTE[0]);
    }

    #[test]
    fn notes_without_id_are_skipped() {
        let notes = vec![note(1), Note::draft("unsaved", ""), note(2)];
        let b = BoardModel::new(&notes, vec![]);
        assert_eq!(b.nodes().len(), 2);
        assert_eq!(b.nodes()[1].id, 2);
    }

    #[test]
    fn drag_moves_only_the_grabbed_node() {
        let mut b = board(3);
        let before: Vec<(f64, f64)> = b.nodes().iter().map(|n| (n.x, n.y)).collect();

        // Grab node 2 at 10px into it, drag, release.
        assert!(b.pointer_down(2, before[1].0 + 10.0, before[1].1 + 10.0));
        assert!(b.is_dragging());
        b.pointer_move(500.0, 400.0);
        b.pointer_up();
        assert!(!b.is_dragging());

        assert_eq!((b.nodes()[1].x, b.nodes()[1].y), (490.0, 390.0));
        assert_eq!((b.nodes()[0].x, b.nodes()[0].y), before[0]);
        assert_eq!((b.nodes()[2].x, b.nodes()[2].y), before[2]);
    }

    #[test]
    fn pointer_move_without_drag_is_a_no_op() {
        let mut b = board(2);
        let before: Vec<(f64, f64)> = b.nodes().iter().map(|n| (n.x, n.y)).collect();
        b.pointer_move(999.0, 999.0);
        let after: Vec<(f64, f64)> = b.nodes().iter().map(|n| (n.x, n.y)).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn drag_does_not_start_while_linking() {
        let mut b = board(2);
        b.toggle_linking();
        assert!(!b.pointer_down(1, 110.0, 110.0));
        assert!(!b.is_dragging());
    }

    #[test]
    fn linking_click_sequence_arms_then_creates() {
        let mut b = board(2);

        b.toggle_linking();
        assert!(b.is_linking());
        assert_eq!(b.link_source(), None);

        assert_eq!(b.click_node(1), ClickOutcome::SourceArmed(1));
        assert_eq!(b.link_source(), Some(1));

        // Clicking the same node again deselects but stays armed.
        assert_eq!(b.click_node(1), ClickOutcome::SourceCleared);
        assert!(b.is_linking());
        assert_eq!(b.link_source(), None);

        assert_eq!(b.click_node(1), ClickOutcome::SourceArmed(1));
        assert_eq!(
            b.click_node(2),
            ClickOutcome::CreateLink {
                source: 1,
                target: 2
            }
        );

        // Success appends the returned link and exits linking mode entirely.
        b.link_created(link(10, 1, 2));
        assert!(!b.is_linking());
        assert_eq!(b.links().len(), 1);
        assert_eq!(b.links()[0].id, 10);
    }

    #[test]
    fn link_failure_resets_to_armed_without_source() {
        let mut b = BoardModel::new(&[note(1), note(2)], vec![link(10, 1, 2)]);

        b.toggle_linking();
        b.click_node(1);
        assert_eq!(
            b.click_node(2),
            ClickOutcome::CreateLink {
                source: 1,
                target: 2
            }
        );

        // Conflict (or any other failure): no duplicate appended, source cleared.
        b.link_create_failed();
        assert!(b.is_linking());
        assert_eq!(b.link_source(), None);
        assert_eq!(b.links().len(), 1);
    }

    #[test]
    fn clicks_are_ignored_outside_linking_mode() {
        let mut b = board(2);
        assert_eq!(b.click_node(1), ClickOutcome::Ignored);
        assert_eq!(b.click_node(99), ClickOutcome::Ignored);
    }

    #[test]
    fn remove_link_only_touches_that_id() {
        let mut b = BoardModel::new(&[note(1), note(2), note(3)], vec![
            link(10, 1, 2),
            link(11, 2, 3),
        ]);
        b.remove_link(10);
        assert_eq!(b.links().len(), 1);
        assert_eq!(b.links()[0].id, 11);

        // Removing an id that is already gone leaves existing links intact.
        b.remove_link(10);
        assert_eq!(b.links().len(), 1);
    }

    #[test]
    fn edge_midpoint_is_between_node_centers() {
        let b = BoardModel::new(&[note(1), note(2)], vec![link(10, 1, 2)]);
        // Node 1 at (100,100), node 2 at (350,100); centers offset by half
        // the node footprint.
        let mid = b.edge_midpoint(&b.links()[0].clone()).expect("both ends exist");
        assert_eq!(mid, (225.0 + NODE_WIDTH / 2.0, 100.0 + NODE_HEIGHT / 2.0));
    }

    #[test]
    fn edge_geometry_is_none_for_missing_endpoint() {
        let b = BoardModel::new(&[note(1)], vec![link(10, 1, 99)]);
        assert!(b.edge_midpoint(&b.links()[0].clone()).is_none());
    }

    #[test]
    fn toggle_linking_off_cancels_armed_source() {
        let mut b = board(2);
        b.toggle_linking();
        b.click_node(1);
        b.toggle_linking();
        assert!(!b.is_linking());
        assert_eq!(b.link_source(), None);
    }
}
