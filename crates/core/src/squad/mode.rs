use std::fmt;

/// Whether the lineup is being edited or viewed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    /// Full validation; placement is derived, not edited.
    #[default]
    View,
    /// Free placement with only the squad size checked.
    Edit,
}

impl Mode {
    /// The other mode.
    pub fn toggled(self) -> Self {
        match self {
            Mode::View => Mode::Edit,
            Mode::Edit => Mode::View,
        }
    }

    /// Whether placement operations are allowed.
    pub fn is_editing(self) -> bool {
        self == Mode::Edit
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::View => f.write_str("View"),
            Mode::Edit => f.write_str("Edit"),
        }
    }
}
