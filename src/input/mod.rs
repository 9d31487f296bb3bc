use crate::geometry::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Middle,
    Secondary,
    Other(u32),
}

impl PointerButton {
    /// Maps a host button number (1 = primary, 2 = middle, 3 = secondary).
    pub const fn from_index(index: u32) -> Self {
        match index {
            1 => Self::Primary,
            2 => Self::Middle,
            3 => Self::Secondary,
            other => Self::Other(other),
        }
    }
}

/// A pointer sample from either a mouse or a touch screen, in client
/// coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum PointerInput {
    Mouse {
        position: Point,
        button: Option<PointerButton>,
    },
    Touch {
        contacts: Vec<Point>,
    },
}

impl PointerInput {
    pub const fn mouse(x: f64, y: f64) -> Self {
        Self::Mouse {
            position: Point::new(x, y),
            button: None,
        }
    }

    pub const fn mouse_button(x: f64, y: f64, button: PointerButton) -> Self {
        Self::Mouse {
            position: Point::new(x, y),
            button: Some(button),
        }
    }

    pub fn touch(x: f64, y: f64) -> Self {
        Self::Touch {
            contacts: vec![Point::new(x, y)],
        }
    }

    /// The single tracked position. Only the first touch contact counts;
    /// a touch sample without contacts has no position.
    pub fn position(&self) -> Option<Point> {
        match self {
            Self::Mouse { position, .. } => Some(*position),
            Self::Touch { contacts } => contacts.first().copied(),
        }
    }

    /// Touch contacts and button-less mouse samples count as primary.
    pub fn is_primary(&self) -> bool {
        match self {
            Self::Mouse { button, .. } => {
                matches!(button, None | Some(PointerButton::Primary))
            }
            Self::Touch { .. } => true,
        }
    }

    pub fn is_touch(&self) -> bool {
        matches!(self, Self::Touch { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touch_position_uses_first_contact() {
        let input = PointerInput::Touch {
            contacts: vec![Point::new(3.0, 4.0), Point::new(50.0, 60.0)],
        };
        assert_eq!(input.position(), Some(Point::new(3.0, 4.0)));
    }

    #[test]
    fn touch_without_contacts_has_no_position() {
        let input = PointerInput::Touch {
            contacts: Vec::new(),
        };
        assert_eq!(input.position(), None);
    }

    #[test]
    fn only_primary_mouse_button_counts_as_primary() {
        assert!(PointerInput::mouse(1.0, 1.0).is_primary());
        assert!(PointerInput::mouse_button(1.0, 1.0, PointerButton::Primary).is_primary());
        assert!(!PointerInput::mouse_button(1.0, 1.0, PointerButton::Secondary).is_primary());
        assert!(PointerInput::touch(1.0, 1.0).is_primary());
    }

    #[test]
    fn button_index_maps_host_numbering() {
        assert_eq!(PointerButton::from_index(1), PointerButton::Primary);
        assert_eq!(PointerButton::from_index(3), PointerButton::Secondary);
        assert_eq!(PointerButton::from_index(9), PointerButton::Other(9));
    }
}
