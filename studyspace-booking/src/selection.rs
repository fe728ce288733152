use studyspace_catalog::{SeatId, SeatStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState {
    Empty,
    Partial,
    Complete,
}

/// What a toggle did to the selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeatToggle {
    Selected,
    Deselected,
    /// The selection was already at the group size; the oldest pick made way.
    Replaced { evicted: SeatId },
}

/// The seats a user has tentatively chosen for one group booking, in
/// selection order (oldest first), bounded by the group size.
#[derive(Debug, Clone)]
pub struct SeatSelection {
    group_size: u32,
    seats: Vec<SeatId>,
}

impl SeatSelection {
    pub fn new(group_size: u32) -> Self {
        Self {
            group_size: group_size.max(1),
            seats: Vec::new(),
        }
    }

    pub fn group_size(&self) -> u32 {
        self.group_size
    }

    pub fn selected(&self) -> &[SeatId] {
        &self.seats
    }

    pub fn len(&self) -> usize {
        self.seats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    pub fn is_selected(&self, seat: &SeatId) -> bool {
        self.seats.contains(seat)
    }

    pub fn state(&self) -> SelectionState {
        if self.seats.is_empty() {
            SelectionState::Empty
        } else if (self.seats.len() as u32) < self.group_size {
            SelectionState::Partial
        } else {
            SelectionState::Complete
        }
    }

    pub fn can_confirm(&self) -> bool {
        self.seats.len() as u32 == self.group_size
    }

    /// Select or deselect a seat. Only available seats (or ones already
    /// selected) are eligible. At capacity the oldest selection is evicted
    /// FIFO and the new seat takes its place.
    pub fn toggle(&mut self, seat: &SeatId, status: SeatStatus) -> Result<SeatToggle, SelectionError> {
        if self.is_selected(seat) {
            self.seats.retain(|s| s != seat);
            return Ok(SeatToggle::Deselected);
        }
        if status != SeatStatus::Available {
            return Err(SelectionError::SeatUnavailable(seat.clone()));
        }
        if (self.seats.len() as u32) < self.group_size {
            self.seats.push(seat.clone());
            Ok(SeatToggle::Selected)
        } else {
            let evicted = self.seats.remove(0);
            self.seats.push(seat.clone());
            Ok(SeatToggle::Replaced { evicted })
        }
    }

    /// Change the group size, evicting the most recent picks down to the new
    /// bound. Returns the evicted seats, newest first.
    pub fn set_group_size(&mut self, size: u32) -> Vec<SeatId> {
        self.group_size = size.max(1);
        let mut evicted = Vec::new();
        while self.seats.len() as u32 > self.group_size {
            if let Some(seat) = self.seats.pop() {
                evicted.push(seat);
            }
        }
        evicted
    }

    pub fn clear(&mut self) {
        self.seats.clear();
    }

    /// Drain the selection, e.g. into a booking request.
    pub fn take(&mut self) -> Vec<SeatId> {
        std::mem::take(&mut self.seats)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("seat {0} is occupied and cannot be selected")]
    SeatUnavailable(SeatId),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> SeatId {
        SeatId::from(s)
    }

    #[test]
    fn test_select_and_deselect() {
        let mut selection = SeatSelection::new(2);
        assert_eq!(selection.state(), SelectionState::Empty);

        assert_eq!(
            selection.toggle(&id("A"), SeatStatus::Available).unwrap(),
            SeatToggle::Selected
        );
        assert_eq!(selection.state(), SelectionState::Partial);

        assert_eq!(
            selection.toggle(&id("A"), SeatStatus::Available).unwrap(),
            SeatToggle::Deselected
        );
        assert_eq!(selection.state(), SelectionState::Empty);
    }

    #[test]
    fn test_fifo_eviction_at_capacity() {
        let mut selection = SeatSelection::new(3);
        for seat in ["A", "B", "C"] {
            selection.toggle(&id(seat), SeatStatus::Available).unwrap();
        }
        assert!(selection.can_confirm());

        let toggle = selection.toggle(&id("D"), SeatStatus::Available).unwrap();
        assert_eq!(toggle, SeatToggle::Replaced { evicted: id("A") });
        assert_eq!(selection.selected(), &[id("B"), id("C"), id("D")]);
        assert_eq!(selection.state(), SelectionState::Complete);
    }

    #[test]
    fn test_selection_never_exceeds_group_size() {
        let mut selection = SeatSelection::new(2);
        for seat in ["A", "B", "C", "D", "E"] {
            selection.toggle(&id(seat), SeatStatus::Available).unwrap();
            assert!(selection.len() as u32 <= selection.group_size());
        }
        assert_eq!(selection.selected(), &[id("D"), id("E")]);
    }

    #[test]
    fn test_occupied_seats_are_rejected_without_state_change() {
        let mut selection = SeatSelection::new(2);
        selection.toggle(&id("A"), SeatStatus::Available).unwrap();

        let result = selection.toggle(&id("B"), SeatStatus::Occupied);
        assert_eq!(result, Err(SelectionError::SeatUnavailable(id("B"))));
        assert_eq!(selection.selected(), &[id("A")]);
    }

    #[test]
    fn test_deselecting_an_occupied_selected_seat_is_allowed() {
        // A selected seat may have flipped occupied elsewhere; deselecting it
        // must still work.
        let mut selection = SeatSelection::new(1);
        selection.toggle(&id("A"), SeatStatus::Available).unwrap();
        assert_eq!(
            selection.toggle(&id("A"), SeatStatus::Occupied).unwrap(),
            SeatToggle::Deselected
        );
    }

    #[test]
    fn test_shrinking_group_size_evicts_newest_first() {
        let mut selection = SeatSelection::new(4);
        for seat in ["A", "B", "C", "D"] {
            selection.toggle(&id(seat), SeatStatus::Available).unwrap();
        }

        let evicted = selection.set_group_size(2);
        assert_eq!(evicted, vec![id("D"), id("C")]);
        assert_eq!(selection.selected(), &[id("A"), id("B")]);
        assert!(selection.can_confirm());
    }

    #[test]
    fn test_growing_group_size_reopens_selection() {
        let mut selection = SeatSelection::new(1);
        selection.toggle(&id("A"), SeatStatus::Available).unwrap();
        assert!(selection.can_confirm());

        selection.set_group_size(2);
        assert!(!selection.can_confirm());
        assert_eq!(selection.state(), SelectionState::Partial);
    }

    #[test]
    fn test_group_size_floor_is_one() {
        let mut selection = SeatSelection::new(0);
        assert_eq!(selection.group_size(), 1);
        selection.toggle(&id("A"), SeatStatus::Available).unwrap();
        assert!(selection.can_confirm());
    }

    #[test]
    fn test_clear_resets_to_empty() {
        let mut selection = SeatSelection::new(2);
        selection.toggle(&id("A"), SeatStatus::Available).unwrap();
        selection.clear();
        assert!(selection.is_empty());
        assert_eq!(selection.state(), SelectionState::Empty);
    }
}
