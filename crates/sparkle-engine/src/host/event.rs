use crate::coords::{Point, Size};
use crate::input::KeyEvent;

/// Platform event consumed by the [`Dispatcher`](super::Dispatcher).
pub enum Event<G> {
    /// The window entered the visible stage; carries its graphics context.
    Visible(G),
    /// The window left the visible stage (closed, suspended, or exit requested).
    Hidden,
    /// The window was resized to the given physical size.
    Resize(Size),
    Key(KeyEvent),
    /// The pointer moved to the given physical position.
    Pointer(Point),
}

impl<G> Event<G> {
    pub fn kind(&self) -> &'static str {
        match self {
            Event::Visible(_) => "visible",
            Event::Hidden => "hidden",
            Event::Resize(_) => "resize",
            Event::Key(_) => "key",
            Event::Pointer(_) => "pointer",
        }
    }
}

impl<G> std::fmt::Debug for Event<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Event::Visible(_) => f.write_str("Visible(..)"),
            Event::Hidden => f.write_str("Hidden"),
            Event::Resize(size) => write!(f, "Resize({size})"),
            Event::Key(k) => write!(f, "Key({k:?})"),
            Event::Pointer(p) => write!(f, "Pointer({}, {})", p.x, p.y),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_the_variant_without_payload() {
        assert_eq!(Event::<()>::Hidden.kind(), "hidden");
        assert_eq!(Event::<()>::Resize(Size::new(3, 4)).kind(), "resize");
        assert_eq!(Event::<()>::Pointer(Point::new(1.0, 2.0)).kind(), "pointer");
    }
}
