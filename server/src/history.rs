//! Move history and per-viewer redaction
//!
//! Records are stored exactly as emitted. Hiding the revealed card from
//! players who must not see it happens on the way out, once per recipient,
//! through [`as_view_of`].

use clue_shared::{Move, MoveRecord, Phase, PlayerId};

/// Append-only log of everything that happened at a table.
#[derive(Debug, Clone, Default)]
pub struct History {
    records: Vec<MoveRecord>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: MoveRecord) {
        self.records.push(record);
    }

    pub fn iter(&self) -> impl Iterator<Item = &MoveRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn last(&self) -> Option<&MoveRecord> {
        self.records.last()
    }

    /// The whole log as the given player is allowed to see it.
    pub fn view_for(&self, viewer: PlayerId) -> Vec<MoveRecord> {
        self.records
            .iter()
            .map(|record| as_view_of(record, viewer))
            .collect()
    }
}

/// Returns the copy of `record` that `viewer` may receive.
///
/// A revealed card is visible to the revealer (the acting player) and to
/// the asker (`current_player` of the delta). Everyone else gets `None` in
/// its place. Records of a finished game are never redacted.
pub fn as_view_of(record: &MoveRecord, viewer: PlayerId) -> MoveRecord {
    let delta = &record.delta;
    if delta.phase == Some(Phase::Ended)
        || record.player == viewer
        || delta.current_player == Some(viewer)
    {
        return record.clone();
    }

    let mut view = record.clone();
    view.delta.revealed_card = None;
    if let Move::RevealCard { card } = &mut view.action {
        *card = None;
    }
    view
}
