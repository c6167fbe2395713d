/// One pointer or keyboard gesture.
#[derive(Debug, Clone)]
pub enum Gesture<E> {
    MoveTo(E),
    Click(E),
    DoubleClick(E),
    ContextClick(E),
    DragAndDrop { source: E, target: E },
    DragByOffset { element: E, x: i64, y: i64 },
    /// Key input sent to whatever has focus.
    SendKeys(String),
}

/// An ordered sequence of gestures performed as one driver request.
#[derive(Debug, Clone)]
pub struct ActionChain<E> {
    gestures: Vec<Gesture<E>>,
}

impl<E> Default for ActionChain<E> {
    fn default() -> Self {
        Self {
            gestures: Vec::new(),
        }
    }
}

impl<E> ActionChain<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn move_to_element(mut self, element: E) -> Self {
        self.gestures.push(Gesture::MoveTo(element));
        self
    }

    pub fn click(mut self, element: E) -> Self {
        self.gestures.push(Gesture::Click(element));
        self
    }

    pub fn double_click(mut self, element: E) -> Self {
        self.gestures.push(Gesture::DoubleClick(element));
        self
    }

    pub fn context_click(mut self, element: E) -> Self {
        self.gestures.push(Gesture::ContextClick(element));
        self
    }

    pub fn drag_and_drop(mut self, source: E, target: E) -> Self {
        self.gestures.push(Gesture::DragAndDrop { source, target });
        self
    }

    pub fn drag_and_drop_by_offset(mut self, element: E, x: i64, y: i64) -> Self {
        self.gestures.push(Gesture::DragByOffset { element, x, y });
        self
    }

    pub fn send_keys(mut self, keys: impl Into<String>) -> Self {
        self.gestures.push(Gesture::SendKeys(keys.into()));
        self
    }
}

impl<E> IntoIterator for ActionChain<E> {
    type Item = Gesture<E>;
    type IntoIter = std::vec::IntoIter<Gesture<E>>;

    fn into_iter(self) -> Self::IntoIter {
        self.gestures.into_iter()
    }
}
