use std::fmt;

/// Diagnostic origin recorded alongside every frame command.
///
/// A tag never influences execution; backends and capture tooling use it to
/// attribute a command back to the call site that recorded it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tag {
    pub file: &'static str,
    pub description: &'static str,
    pub line: u32,
}

impl Tag {
    pub const fn new(file: &'static str, description: &'static str, line: u32) -> Self {
        Self {
            file,
            description,
            line,
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} [{}]", self.file, self.line, self.description)
    }
}

/// Build a [`Tag`] carrying the current file and line plus a short
/// human-readable description.
#[macro_export]
macro_rules! render_tag {
    ($description:expr) => {
        $crate::Tag::new(file!(), $description, line!())
    };
}
