/// Generational handle: `(index, generation)`.
///
/// The index addresses a slot in a struct-of-arrays store; the generation is
/// bumped whenever the slot is recycled so stale handles can be detected.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(u32, u32);

impl Handle {
    pub fn new(index: u32, generation: u32) -> Self {
        Handle(index, generation)
    }

    pub fn index(&self) -> u32 {
        self.0
    }

    pub fn generation(&self) -> u32 {
        self.1
    }
}
