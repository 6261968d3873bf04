//! Character-at-a-time tag/entity scanner behind normal-mode rendering.

use std::fmt;

use html_escape::decode_html_entities;

/// Where the scanner is between two input characters.
#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    /// Text outside every `<body>` element; nothing is emitted.
    OutsideBody,
    /// Text inside a `<body>` element; characters are emitted.
    BodyText,
    /// Inside a `<body>` element after `&`, collecting up to `;`.
    BodyEntity(String),
    /// After `<`, collecting the tag token up to `>`. An entity that was open
    /// when the tag started resumes after it while the body stays open.
    TagName { token: String, pending_entity: Option<String> },
}

/// Output produced by one input character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Emit {
    Char(char),
    /// A decoded entity reference (unknown references decode to themselves).
    Entity(String),
}

impl fmt::Display for Emit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Emit::Char(c) => fmt::Write::write_char(f, *c),
            Emit::Entity(s) => f.write_str(s),
        }
    }
}

/// Tag nesting and entity state for one render pass.
///
/// The open-tag stack is only matched against its top: a token equal to
/// `/` + the top name pops it, any other token is pushed. Text is visible
/// while `body` appears anywhere in the stack. An entity still pending when
/// the body region closes is discarded and does not resume in a later body.
#[derive(Debug, Clone)]
pub struct RenderState {
    open_tags: Vec<String>,
    state: State,
}

impl Default for RenderState {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderState {
    pub fn new() -> Self {
        Self { open_tags: Vec::new(), state: State::OutsideBody }
    }

    /// Open tag names, outermost first.
    pub fn open_tags(&self) -> &[String] {
        &self.open_tags
    }

    pub fn in_body(&self) -> bool {
        self.open_tags.iter().any(|tag| tag == "body")
    }

    pub fn in_tag(&self) -> bool {
        matches!(self.state, State::TagName { .. })
    }

    /// Entity text collected so far, if an entity is open.
    pub fn pending_entity(&self) -> Option<&str> {
        match &self.state {
            State::BodyEntity(entity) => Some(entity),
            State::TagName { pending_entity, .. } => pending_entity.as_deref(),
            _ => None,
        }
    }

    /// Advance by one character, returning what it makes visible.
    pub fn feed(&mut self, c: char) -> Option<Emit> {
        if c == '<' {
            let pending_entity = match std::mem::replace(&mut self.state, State::OutsideBody) {
                State::BodyEntity(entity) => Some(entity),
                State::TagName { pending_entity, .. } => pending_entity,
                State::OutsideBody | State::BodyText => None,
            };
            self.state = State::TagName { token: String::new(), pending_entity };
            return None;
        }

        match &mut self.state {
            State::TagName { .. } if c == '>' => {
                self.close_token();
                None
            }
            State::TagName { token, .. } => {
                token.push(c);
                None
            }
            State::OutsideBody => None,
            State::BodyText if c == '&' => {
                self.state = State::BodyEntity(String::from('&'));
                None
            }
            State::BodyText => Some(Emit::Char(c)),
            State::BodyEntity(entity) => {
                entity.push(c);
                if c != ';' {
                    return None;
                }
                let decoded = decode_html_entities(entity.as_str()).into_owned();
                self.state = State::BodyText;
                Some(Emit::Entity(decoded))
            }
        }
    }

    fn close_token(&mut self) {
        let State::TagName { token, pending_entity } = std::mem::replace(&mut self.state, State::OutsideBody) else {
            return;
        };

        let name = token.split(char::is_whitespace).next().unwrap_or_default();
        let closes_top = self
            .open_tags
            .last()
            .is_some_and(|top| name.strip_prefix('/') == Some(top.as_str()));

        if closes_top {
            self.open_tags.pop();
        } else {
            self.open_tags.push(name.to_string());
        }

        self.state = match (self.in_body(), pending_entity) {
            (false, _) => State::OutsideBody,
            (true, Some(entity)) => State::BodyEntity(entity),
            (true, None) => State::BodyText,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_all(state: &mut RenderState, input: &str) -> String {
        input.chars().filter_map(|c| state.feed(c)).map(|e| e.to_string()).collect()
    }

    #[test]
    fn test_tag_stack_push_and_pop() {
        let mut state = RenderState::new();
        feed_all(&mut state, "<html><body><p>");
        assert_eq!(state.open_tags(), ["html", "body", "p"]);
        assert!(state.in_body());

        feed_all(&mut state, "</p>");
        assert_eq!(state.open_tags(), ["html", "body"]);

        feed_all(&mut state, "</body>");
        assert_eq!(state.open_tags(), ["html"]);
        assert!(!state.in_body());
    }

    #[test]
    fn test_attributes_are_dropped() {
        let mut state = RenderState::new();
        feed_all(&mut state, "<body class=\"main\"><a href=\"/x\">");
        assert_eq!(state.open_tags(), ["body", "a"]);
    }

    #[test]
    fn test_mismatched_close_is_pushed() {
        let mut state = RenderState::new();
        feed_all(&mut state, "<body><b></i>");
        assert_eq!(state.open_tags(), ["body", "b", "/i"]);
    }

    #[test]
    fn test_in_tag_flag() {
        let mut state = RenderState::new();
        assert_eq!(state.feed('<'), None);
        assert!(state.in_tag());
        feed_all(&mut state, "body>");
        assert!(!state.in_tag());
    }

    #[test]
    fn test_text_outside_body_is_suppressed() {
        let mut state = RenderState::new();
        assert_eq!(feed_all(&mut state, "<html><head><title>T</title></head>"), "");
        assert_eq!(feed_all(&mut state, "<body>shown</body>after"), "shown");
    }

    #[test]
    fn test_entity_emitted_on_semicolon() {
        let mut state = RenderState::new();
        feed_all(&mut state, "<body>");
        assert_eq!(state.feed('&'), None);
        assert_eq!(state.feed('l'), None);
        assert_eq!(state.feed('t'), None);
        assert_eq!(state.pending_entity(), Some("&lt"));
        assert_eq!(state.feed(';'), Some(Emit::Entity("<".into())));
        assert_eq!(state.pending_entity(), None);
    }

    #[test]
    fn test_unknown_entity_passes_through() {
        let mut state = RenderState::new();
        assert_eq!(feed_all(&mut state, "<body>&bogus;</body>"), "&bogus;");
    }

    #[test]
    fn test_numeric_entities() {
        let mut state = RenderState::new();
        assert_eq!(feed_all(&mut state, "<body>&#65;&#x42;&amp;</body>"), "AB&");
    }

    #[test]
    fn test_unterminated_entity_never_flushes() {
        let mut state = RenderState::new();
        assert_eq!(feed_all(&mut state, "<body>fish &chips"), "fish ");
        assert_eq!(state.pending_entity(), Some("&chips"));
    }

    #[test]
    fn test_entity_resumes_across_tag() {
        let mut state = RenderState::new();
        assert_eq!(feed_all(&mut state, "<body>&l<b>t;</b></body>"), "<");
    }

    #[test]
    fn test_entity_dropped_when_body_closes() {
        let mut state = RenderState::new();
        assert_eq!(feed_all(&mut state, "<body>&amp</body><body>x</body>"), "x");
    }

    #[test]
    fn test_lone_greater_than_is_text() {
        let mut state = RenderState::new();
        assert_eq!(feed_all(&mut state, "<body>a > b</body>"), "a > b");
    }
}
