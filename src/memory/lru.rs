use std::collections::VecDeque;

/// Anything that can live in a slot of an associative [`Set`].
pub trait Line: Copy + Default {
    fn tag(&self) -> u32;
    fn is_valid(&self) -> bool;
    /// Physical frame this line was filled from
    fn frame(&self) -> u32;
    fn invalidate(&mut self);
}

/// A fixed-capacity set ordered by recency: front is least recently used,
/// back is most recently used.
///
/// Every slot exists from construction on (starting out invalid) and is only
/// ever overwritten in place, so the set never grows or shrinks.
//
//  Touching an entry is O(n) in the associativity, which tops out at 8.
#[derive(Debug, Clone)]
pub struct Set<T: Line> {
    inner: VecDeque<T>,
}

impl<T: Line> Set<T> {
    pub fn new(capacity: usize) -> Self {
        let inner = std::iter::repeat(T::default()).take(capacity).collect();
        Set { inner }
    }

    pub fn capacity(&self) -> usize {
        self.inner.len()
    }

    /// Look up a valid entry by tag. If found, the entry is 'touched' and moved to
    /// the back of the queue. Misses leave the order alone.
    pub fn lookup(&mut self, tag: u32) -> Option<&mut T> {
        let idx = self.position(tag)?;
        let entry = self.inner.remove(idx)?;
        self.inner.push_back(entry);
        self.inner.back_mut()
    }

    /// Like [`Set::lookup`], but without touching the entry
    pub fn peek_mut(&mut self, tag: u32) -> Option<&mut T> {
        let idx = self.position(tag)?;
        self.inner.get_mut(idx)
    }

    /// Install `entry` as the most recently used slot, returning what the slot held
    /// before.
    ///
    /// Normally that's the LRU slot. If a valid entry with the same tag is already
    /// present its slot is reused instead, so a tag is never valid twice.
    pub fn push(&mut self, entry: T) -> T {
        let victim = match self.position(entry.tag()) {
            Some(idx) => self.inner.remove(idx),
            None => self.inner.pop_front(),
        };
        self.inner.push_back(entry);
        victim.unwrap_or_default()
    }

    /// The slot the next [`Set::push`] of a new tag will overwrite
    pub fn lru(&self) -> Option<&T> {
        self.inner.front()
    }

    /// Invalidates every slot filled from `frame`, returning the prior contents of
    /// each slot that was still valid.
    pub fn invalidate_frame(&mut self, frame: u32) -> impl Iterator<Item = T> + '_ {
        self.inner
            .iter_mut()
            .filter(move |entry| entry.is_valid() && entry.frame() == frame)
            .map(|entry| {
                let prior = *entry;
                entry.invalidate();
                prior
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.inner.iter()
    }

    fn position(&self, tag: u32) -> Option<usize> {
        self.inner
            .iter()
            .position(|entry| entry.is_valid() && entry.tag() == tag)
    }
}
