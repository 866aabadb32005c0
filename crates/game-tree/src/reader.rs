//! Notation reader: turns document text into an unvalidated raw move tree.
//!
//! Moves are kept as SAN text here. Legality is only checked later, when the
//! builder replays them through the rules oracle.

use std::ops::ControlFlow;

use pgn_reader::{Nag, RawComment, RawTag, Reader, SanPlus, Skip, Visitor};

use crate::error::GameError;

/// One parsed move with its raw comments, codes and continuations.
/// `children[0]` is the mainline continuation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawNode {
    pub san: String,
    pub comments: Vec<String>,
    pub nags: Vec<u8>,
    pub children: Vec<RawNode>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawGame {
    pub headers: Vec<(String, String)>,
    pub root_comments: Vec<String>,
    /// Continuations of the starting position.
    pub moves: Vec<RawNode>,
}

impl RawGame {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Default)]
struct Slot {
    san: String,
    comments: Vec<String>,
    nags: Vec<u8>,
    parent: usize,
    children: Vec<usize>,
}

/// State during movetext parsing. Slot 0 stands for the starting position.
struct Movetext {
    headers: Vec<(String, String)>,
    slots: Vec<Slot>,
    current: usize,
    /// Where to resume after each open variation.
    stack: Vec<usize>,
    /// Comments seen right after `(`, waiting for the variation's first move.
    opening: Option<Vec<String>>,
}

impl Movetext {
    fn into_node(slots: &mut [Slot], idx: usize) -> RawNode {
        let children = std::mem::take(&mut slots[idx].children);
        let slot = &mut slots[idx];
        let mut node = RawNode {
            san: std::mem::take(&mut slot.san),
            comments: std::mem::take(&mut slot.comments),
            nags: std::mem::take(&mut slot.nags),
            children: Vec::with_capacity(children.len()),
        };
        for child in children {
            node.children.push(Self::into_node(slots, child));
        }
        node
    }
}

/// Visitor that collects one game into a [`RawGame`].
struct RawCollector;

impl Visitor for RawCollector {
    type Tags = Vec<(String, String)>;
    type Movetext = Movetext;
    type Output = RawGame;

    fn begin_tags(&mut self) -> ControlFlow<RawGame, Self::Tags> {
        ControlFlow::Continue(Vec::new())
    }

    fn tag(
        &mut self,
        tags: &mut Self::Tags,
        name: &[u8],
        value: RawTag<'_>,
    ) -> ControlFlow<RawGame> {
        tags.push((
            String::from_utf8_lossy(name).into_owned(),
            value.decode_utf8_lossy().into_owned(),
        ));
        ControlFlow::Continue(())
    }

    fn begin_movetext(&mut self, tags: Self::Tags) -> ControlFlow<RawGame, Movetext> {
        ControlFlow::Continue(Movetext {
            headers: tags,
            slots: vec![Slot::default()],
            current: 0,
            stack: Vec::new(),
            opening: None,
        })
    }

    fn san(&mut self, state: &mut Movetext, san_plus: SanPlus) -> ControlFlow<RawGame> {
        let idx = state.slots.len();
        state.slots.push(Slot {
            san: san_plus.to_string(),
            comments: state.opening.take().unwrap_or_default(),
            parent: state.current,
            ..Slot::default()
        });
        state.slots[state.current].children.push(idx);
        state.current = idx;
        ControlFlow::Continue(())
    }

    fn nag(&mut self, state: &mut Movetext, nag: Nag) -> ControlFlow<RawGame> {
        if state.current != 0 {
            state.slots[state.current].nags.push(nag.0);
        }
        ControlFlow::Continue(())
    }

    fn comment(&mut self, state: &mut Movetext, comment: RawComment<'_>) -> ControlFlow<RawGame> {
        let text = String::from_utf8_lossy(comment.as_bytes()).into_owned();
        match state.opening.as_mut() {
            Some(pending) => pending.push(text),
            None => state.slots[state.current].comments.push(text),
        }
        ControlFlow::Continue(())
    }

    fn begin_variation(&mut self, state: &mut Movetext) -> ControlFlow<RawGame, Skip> {
        // A variation is an alternative to the last move, so it branches
        // from that move's parent.
        state.stack.push(state.current);
        state.current = state.slots[state.current].parent;
        state.opening = Some(Vec::new());
        ControlFlow::Continue(Skip(false))
    }

    fn end_variation(&mut self, state: &mut Movetext) -> ControlFlow<RawGame> {
        state.current = state.stack.pop().unwrap_or(0);
        state.opening = None;
        ControlFlow::Continue(())
    }

    fn end_game(&mut self, mut state: Movetext) -> RawGame {
        let root = Movetext::into_node(&mut state.slots, 0);
        RawGame {
            headers: state.headers,
            root_comments: root.comments,
            moves: root.children,
        }
    }
}

/// Read the first game of a document. `Ok(None)` means no game was found.
pub fn read_raw(text: &str) -> Result<Option<RawGame>, GameError> {
    let mut reader = Reader::new(text.as_bytes());
    Ok(reader.read_game(&mut RawCollector)?)
}
