/// One page-sized frame of physical memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysicalFrame {
    pub number: u32,
    /// Written since it was last handed out
    pub modified: bool,
    /// Has ever been handed out. Cold frames hold nothing that needs invalidating.
    pub referenced_before: bool,
}

/// What came back from [`FrameAllocator::acquire`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Acquired {
    pub frame: u32,
    /// The frame held some other page, which now has to be evicted everywhere
    pub was_warm: bool,
    /// ... and that page has to go back to disk first
    pub was_dirty: bool,
}

#[derive(Debug, Clone, Copy, Default)]
struct Link {
    prev: Option<u32>,
    next: Option<u32>,
}

/// The pool of physical frames, recycled in least-recently-touched order.
///
/// Frames live in a fixed array indexed by frame number. The recency queue is a
/// doubly linked list threaded through that array by frame number, so touching
/// and recycling are both O(1).
#[derive(Debug)]
pub struct FrameAllocator {
    frames: Vec<PhysicalFrame>,
    links: Vec<Link>,
    head: Option<u32>,
    tail: Option<u32>,
}

impl FrameAllocator {
    pub fn new(physical_pages: u32) -> Self {
        let frames = (0..physical_pages)
            .map(|number| PhysicalFrame { number, modified: false, referenced_before: false })
            .collect();
        let mut pool = FrameAllocator {
            frames,
            links: vec![Link::default(); physical_pages as usize],
            head: None,
            tail: None,
        };
        for number in 0..physical_pages {
            pool.push_back(number);
        }
        pool
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frame(&self, number: u32) -> Option<&PhysicalFrame> {
        self.frames.get(number as usize)
    }

    /// Hands out the least recently touched frame, cold or warm, and requeues it
    /// as the most recent. `None` only if the pool is empty.
    pub fn acquire(&mut self) -> Option<Acquired> {
        let number = self.head?;
        let frame = &mut self.frames[number as usize];
        let acquired = Acquired {
            frame: number,
            was_warm: frame.referenced_before,
            was_dirty: frame.modified,
        };
        frame.referenced_before = true;
        frame.modified = false;

        self.unlink(number);
        self.push_back(number);
        Some(acquired)
    }

    /// Moves a frame to the back of the queue so a busy frame never reaches the front
    pub fn touch(&mut self, number: u32) {
        let Some(frame) = self.frames.get_mut(number as usize) else {
            return;
        };
        frame.referenced_before = true;
        self.unlink(number);
        self.push_back(number);
    }

    pub fn mark_modified(&mut self, number: u32) {
        if let Some(frame) = self.frames.get_mut(number as usize) {
            frame.modified = true;
        }
    }

    /// Frame numbers from next-to-be-recycled to most recently touched
    pub fn order(&self) -> impl Iterator<Item = u32> + '_ {
        std::iter::successors(self.head, |&number| self.links[number as usize].next)
    }

    fn unlink(&mut self, number: u32) {
        let Link { prev, next } = std::mem::take(&mut self.links[number as usize]);
        match prev {
            Some(p) => self.links[p as usize].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.links[n as usize].prev = prev,
            None => self.tail = prev,
        }
    }

    fn push_back(&mut self, number: u32) {
        self.links[number as usize] = Link { prev: self.tail, next: None };
        match self.tail {
            Some(t) => self.links[t as usize].next = Some(number),
            None => self.head = Some(number),
        }
        self.tail = Some(number);
    }
}
