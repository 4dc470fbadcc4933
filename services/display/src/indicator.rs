/// Most dots the position indicator ever shows
pub const MAX_DOTS: usize = 5;

/// One slot of the position indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// Dot standing for the feed entry at this index
    Dot { index: usize, current: bool },
    /// Entries skipped between two dots
    Gap,
}

/// Indices the indicator shows for a feed of `len` entries
///
/// Short feeds get one dot per entry. Longer feeds always show the first and
/// last entry plus a window around `current`, pinned to the edges near either
/// end.
pub fn dot_indices(len: usize, current: usize) -> Vec<usize> {
    if len <= MAX_DOTS {
        return (0..len).collect();
    }

    let last = len - 1;
    let mut dots = if current <= 1 {
        vec![0, 1, 2, 3, last]
    } else if current >= last - 1 {
        vec![0, last - 3, last - 2, last - 1, last]
    } else {
        vec![0, current - 1, current, current + 1, last]
    };

    dots.sort_unstable();
    dots.dedup();
    dots
}

/// Indicator slots with a gap marker before any dot that skips entries
pub fn slots(len: usize, current: usize) -> Vec<Slot> {
    let dots = dot_indices(len, current);
    let mut slots = Vec::with_capacity(dots.len() * 2);

    for (i, &index) in dots.iter().enumerate() {
        if i > 0 && index - dots[i - 1] > 1 {
            slots.push(Slot::Gap);
        }
        slots.push(Slot::Dot {
            index,
            current: index == current,
        });
    }

    slots
}
