use std::fmt;

/// Special keys, encoded as the WebDriver private-use code points so they can
/// be embedded in ordinary strings passed to `send_keys`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Null,
    Backspace,
    Tab,
    Return,
    Enter,
    Shift,
    Control,
    Alt,
    Escape,
    Space,
    PageUp,
    PageDown,
    End,
    Home,
    ArrowLeft,
    ArrowUp,
    ArrowRight,
    ArrowDown,
    Insert,
    Delete,
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
    Meta,
}

const KEY_TABLE: &[(Key, char, &str)] = &[
    (Key::Null, '\u{e000}', ""),
    (Key::Backspace, '\u{e003}', "Backspace"),
    (Key::Tab, '\u{e004}', "Tab"),
    (Key::Return, '\u{e006}', "Enter"),
    (Key::Enter, '\u{e007}', "Enter"),
    (Key::Shift, '\u{e008}', "Shift"),
    (Key::Control, '\u{e009}', "Control"),
    (Key::Alt, '\u{e00a}', "Alt"),
    (Key::Escape, '\u{e00c}', "Escape"),
    (Key::Space, '\u{e00d}', " "),
    (Key::PageUp, '\u{e00e}', "PageUp"),
    (Key::PageDown, '\u{e00f}', "PageDown"),
    (Key::End, '\u{e010}', "End"),
    (Key::Home, '\u{e011}', "Home"),
    (Key::ArrowLeft, '\u{e012}', "ArrowLeft"),
    (Key::ArrowUp, '\u{e013}', "ArrowUp"),
    (Key::ArrowRight, '\u{e014}', "ArrowRight"),
    (Key::ArrowDown, '\u{e015}', "ArrowDown"),
    (Key::Insert, '\u{e016}', "Insert"),
    (Key::Delete, '\u{e017}', "Delete"),
    (Key::F1, '\u{e031}', "F1"),
    (Key::F2, '\u{e032}', "F2"),
    (Key::F3, '\u{e033}', "F3"),
    (Key::F4, '\u{e034}', "F4"),
    (Key::F5, '\u{e035}', "F5"),
    (Key::F6, '\u{e036}', "F6"),
    (Key::F7, '\u{e037}', "F7"),
    (Key::F8, '\u{e038}', "F8"),
    (Key::F9, '\u{e039}', "F9"),
    (Key::F10, '\u{e03a}', "F10"),
    (Key::F11, '\u{e03b}', "F11"),
    (Key::F12, '\u{e03c}', "F12"),
    (Key::Meta, '\u{e03d}', "Meta"),
];

impl Key {
    pub fn as_char(&self) -> char {
        KEY_TABLE
            .iter()
            .find(|(key, _, _)| key == self)
            .map(|(_, ch, _)| *ch)
            .unwrap_or('\u{e000}')
    }

    /// DevTools `key` name used when dispatching the key event.
    pub fn dom_name(&self) -> &'static str {
        KEY_TABLE
            .iter()
            .find(|(key, _, _)| key == self)
            .map(|(_, _, name)| *name)
            .unwrap_or("")
    }

    pub fn from_char(ch: char) -> Option<Key> {
        KEY_TABLE
            .iter()
            .find(|(_, c, _)| *c == ch)
            .map(|(key, _, _)| *key)
    }

    pub fn is_modifier(&self) -> bool {
        matches!(self, Key::Shift | Key::Control | Key::Alt | Key::Meta)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// One step of a typed key sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyStroke {
    Text(String),
    /// A special key pressed while `modifiers` are held.
    Press { key: Key, modifiers: Vec<Key> },
    /// A printable character pressed while `modifiers` are held.
    Chord { ch: char, modifiers: Vec<Key> },
}

/// Splits a `send_keys` string into plain text runs and key presses.
///
/// Modifiers stay held until [`Key::Null`] or the end of the string, so
/// `"{Control}a"` becomes a chord of Control+a.
pub fn parse_keys(input: &str) -> Vec<KeyStroke> {
    let mut strokes = Vec::new();
    let mut held: Vec<Key> = Vec::new();
    let mut text = String::new();

    for ch in input.chars() {
        match Key::from_char(ch) {
            Some(Key::Null) => {
                flush_text(&mut text, &mut strokes);
                held.clear();
            }
            Some(key) if key.is_modifier() => {
                flush_text(&mut text, &mut strokes);
                if !held.contains(&key) {
                    held.push(key);
                }
            }
            Some(key) => {
                flush_text(&mut text, &mut strokes);
                strokes.push(KeyStroke::Press {
                    key,
                    modifiers: held.clone(),
                });
            }
            None if held.is_empty() => text.push(ch),
            None => strokes.push(KeyStroke::Chord {
                ch,
                modifiers: held.clone(),
            }),
        }
    }
    flush_text(&mut text, &mut strokes);
    strokes
}

fn flush_text(text: &mut String, strokes: &mut Vec<KeyStroke>) {
    if !text.is_empty() {
        strokes.push(KeyStroke::Text(std::mem::take(text)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_use_webdriver_code_points() {
        assert_eq!(Key::Enter.as_char(), '\u{e007}');
        assert_eq!(Key::Tab.as_char(), '\u{e004}');
        assert_eq!(Key::Escape.as_char(), '\u{e00c}');
        assert_eq!(Key::from_char('\u{e009}'), Some(Key::Control));
        assert_eq!(Key::from_char('a'), None);
        assert_eq!(Key::ArrowDown.dom_name(), "ArrowDown");
    }

    #[test]
    fn plain_text_stays_one_run() {
        assert_eq!(
            parse_keys("hello world"),
            vec![KeyStroke::Text("hello world".into())]
        );
    }

    #[test]
    fn special_keys_split_text() {
        let input = format!("abc{}def", Key::Enter);
        assert_eq!(
            parse_keys(&input),
            vec![
                KeyStroke::Text("abc".into()),
                KeyStroke::Press {
                    key: Key::Enter,
                    modifiers: vec![]
                },
                KeyStroke::Text("def".into()),
            ]
        );
    }

    #[test]
    fn modifiers_are_held_until_null() {
        let input = format!("{}{}a{}b", Key::Control, Key::Shift, Key::Null);
        assert_eq!(
            parse_keys(&input),
            vec![
                KeyStroke::Chord {
                    ch: 'a',
                    modifiers: vec![Key::Control, Key::Shift]
                },
                KeyStroke::Text("b".into()),
            ]
        );
    }
}
