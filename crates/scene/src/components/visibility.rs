#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Visibility {
    pub visible: bool,
}

impl Visibility {
    pub fn visible() -> Self {
        Self { visible: true }
    }

    pub fn hidden() -> Self {
        Self { visible: false }
    }

    pub fn from_bool(visible: bool) -> Self {
        Self { visible }
    }
}

impl Default for Visibility {
    fn default() -> Self {
        Self::visible()
    }
}
