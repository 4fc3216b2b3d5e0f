use foundation::handles::Handle;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub Handle);

impl EntityId {
    pub fn index(&self) -> u32 {
        self.0.index()
    }

    pub fn generation(&self) -> u32 {
        self.0.generation()
    }

    /// Stable `u64` key, e.g. for keying animation tasks.
    pub fn key(&self) -> u64 {
        ((self.generation() as u64) << 32) | self.index() as u64
    }
}
