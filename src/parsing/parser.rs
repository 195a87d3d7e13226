//! Recursive-descent parser producing green trees.
//!
//! ## Purpose
//! Turns feature text into a complete, lossless green tree. Every byte ends up
//! in exactly one token or trivia; lines the grammar cannot place become
//! skipped-tokens trivia carrying a diagnostic.
//!
//! ## Structure
//! Parsing is line-oriented. Each construct pushes a [`Frame`] while it is
//! open; a line the innermost frame does not accept either closes frames until
//! one that does, or is skipped when no open frame wants it. Blank lines and
//! comments are buffered and become leading trivia of the next token.

use std::mem;

use tracing::{debug, trace};

use super::escaping::{unescape_doc_string_line, TableLiteralEscaping};
use super::matcher::{is_space, HeaderKind, LineToken, TokenMatcher};
use super::table_lexer::{lex_row, RowLexeme};
use super::ParseOptions;
use crate::dialect::DialectProvider;
use crate::syntax::diagnostic::{DiagnosticDescriptor, InternalDiagnostic};
use crate::syntax::green::RawNode;
use crate::syntax::{
    slots, SyntaxKind, DANGLING_TAGS, INCONSISTENT_CELL_COUNT, MISSING_COLON, UNEXPECTED_LINE,
    UNKNOWN_LANGUAGE, UNTERMINATED_DOC_STRING, UNTERMINATED_TABLE_ROW,
};
use crate::text::{split_lines, LinePosition, LinePositionSpan, Location, TextLine, TextSpan};
use crate::{to_error_source, GherkinError};

/// Parses `text` into a `GherkinDocument` green node whose width equals
/// `text.len()`.
pub(crate) fn parse(text: &str, options: &ParseOptions, path: &str) -> Result<RawNode, GherkinError> {
    let parser = Parser::new(text, options, path)?;
    debug!(
        culture = %options.culture,
        stop_at_first_error = options.stop_at_first_error,
        lines = parser.lines.len(),
        "parsing feature text"
    );
    let root = parser.parse_document();
    debug_assert_eq!(root.width(), text.len());
    Ok(root)
}

// ============================================================================
// PIECES AND LINE CURSOR
// ============================================================================

/// A token or trivia candidate on one line, before trivia is attached.
#[derive(Debug)]
struct Piece {
    kind: SyntaxKind,
    start: usize,
    end: usize,
    value: Option<String>,
    missing: bool,
    diagnostics: Vec<InternalDiagnostic>,
}

impl Piece {
    fn new(kind: SyntaxKind, start: usize, end: usize) -> Self {
        Self {
            kind,
            start,
            end,
            value: None,
            missing: false,
            diagnostics: Vec::new(),
        }
    }

    fn diagnose(&mut self, diagnostic: Option<InternalDiagnostic>) -> &mut Self {
        self.diagnostics.extend(diagnostic);
        self
    }
}

/// Walks one line left to right, cutting it into pieces.
struct LineCursor<'t> {
    text: &'t str,
    pos: usize,
    end: usize,
    break_end: usize,
    pieces: Vec<Piece>,
}

impl<'t> LineCursor<'t> {
    fn new(text: &'t str, line: &TextLine) -> Self {
        Self {
            text,
            pos: line.start,
            end: line.end,
            break_end: line.end_including_break,
            pieces: Vec::new(),
        }
    }

    fn rest(&self) -> &'t str {
        &self.text[self.pos..self.end]
    }

    fn push(&mut self, kind: SyntaxKind, len: usize) -> &mut Piece {
        let start = self.pos;
        self.pos += len;
        self.pieces.push(Piece::new(kind, start, self.pos));
        let last = self.pieces.len() - 1;
        &mut self.pieces[last]
    }

    fn whitespace(&mut self) {
        let rest = self.rest();
        let len = rest.len() - rest.trim_start_matches(is_space).len();
        if len > 0 {
            self.push(SyntaxKind::WhitespaceTrivia, len);
        }
    }

    /// Pushes the rest of the line up to its last non-space character.
    fn rest_trimmed(&mut self, kind: SyntaxKind) -> Option<&mut Piece> {
        let len = self.rest().trim_end_matches(is_space).len();
        (len > 0).then(|| self.push(kind, len))
    }

    fn missing(&mut self, kind: SyntaxKind, diagnostic: Option<InternalDiagnostic>) {
        let mut piece = Piece::new(kind, self.pos, self.pos);
        piece.missing = true;
        piece.diagnose(diagnostic);
        self.pieces.push(piece);
    }

    fn finish(mut self) -> Vec<Piece> {
        self.whitespace();
        if self.pos < self.end {
            let len = self.end - self.pos;
            self.push(SyntaxKind::SkippedTokensTrivia, len);
        }
        if self.break_end > self.end {
            let len = self.break_end - self.end;
            self.push(SyntaxKind::EndOfLineTrivia, len);
        }
        self.pieces
    }
}

/// A node with `count` slots, filled at the given indices.
fn build<const N: usize>(
    kind: SyntaxKind,
    count: usize,
    filled: [(usize, Option<RawNode>); N],
) -> RawNode {
    let mut slots = vec![None; count];
    for (index, child) in filled {
        slots[index] = child;
    }
    RawNode::node(kind, slots)
}

// ============================================================================
// FRAMES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Document,
    Feature,
    Rule,
    Background,
    Scenario,
    Examples,
}

impl Level {
    /// What this level can continue with, for "expected ..." messages.
    fn expects(self) -> &'static [&'static str] {
        match self {
            Level::Document => &["Feature", "tags"],
            Level::Feature => &["Background", "Scenario", "Rule", "tags"],
            Level::Rule => &["Background", "Scenario", "tags"],
            Level::Background => &["step"],
            Level::Scenario => &["step", "Examples", "tags"],
            Level::Examples => &["table row"],
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    level: Level,
    has_background: bool,
    has_children: bool,
    has_examples: bool,
    has_table: bool,
}

impl Frame {
    fn new(level: Level) -> Self {
        Self {
            level,
            has_background: false,
            has_children: false,
            has_examples: false,
            has_table: false,
        }
    }
}

/// Keyword, colon and name of a header line.
struct Header {
    keyword: Option<RawNode>,
    colon: Option<RawNode>,
    name: Option<RawNode>,
}

// ============================================================================
// PARSER
// ============================================================================

struct Parser<'t> {
    text: &'t str,
    path: String,
    lines: Vec<TextLine>,
    next: usize,
    provider: DialectProvider,
    matcher: TokenMatcher,
    frames: Vec<Frame>,
    pending: Vec<RawNode>,
    stop_at_first_error: bool,
    aborted: bool,
    errors: usize,
    feature_seen: bool,
}

impl<'t> Parser<'t> {
    fn new(text: &'t str, options: &ParseOptions, path: &str) -> Result<Self, GherkinError> {
        let provider = DialectProvider::new(options.culture.clone());
        let dialect = provider.get_dialect(&options.culture, None)?;
        Ok(Self {
            text,
            path: path.to_string(),
            lines: split_lines(text),
            next: 0,
            provider,
            matcher: TokenMatcher::new(dialect),
            frames: Vec::new(),
            pending: Vec::new(),
            stop_at_first_error: options.stop_at_first_error,
            aborted: false,
            errors: 0,
            feature_seen: false,
        })
    }

    // ------------------------------------------------------------------
    // Lines and classification
    // ------------------------------------------------------------------

    fn current_line(&self) -> Option<TextLine> {
        self.lines.get(self.next).copied()
    }

    fn content(&self, line: &TextLine) -> &'t str {
        self.text[line.start..line.end].trim_start_matches(is_space)
    }

    fn peek(&self) -> Option<LineToken> {
        let line = self.lines.get(self.next)?;
        Some(self.matcher.classify(self.content(line)))
    }

    /// The header that the tag lines starting here lead to, if any.
    fn tag_target(&self) -> Option<HeaderKind> {
        self.lines[self.next..]
            .iter()
            .map(|line| self.matcher.classify(self.content(line)))
            .find(|token| !token.is_trivia() && *token != LineToken::TagLine)
            .and_then(|token| match token {
                LineToken::Header { kind, .. } => Some(kind),
                _ => None,
            })
    }

    fn header_accepted(&self, frame: &Frame, kind: HeaderKind) -> bool {
        use HeaderKind::*;
        match (frame.level, kind) {
            (Level::Document, Feature) => !self.feature_seen,
            (Level::Feature | Level::Rule, Background) => {
                !frame.has_background && !frame.has_children
            }
            (Level::Feature, Scenario | ScenarioOutline | Rule) => true,
            (Level::Rule, Scenario | ScenarioOutline) => true,
            (Level::Scenario, Examples) => true,
            _ => false,
        }
    }

    fn frame_accepts(&self, frame: &Frame, token: &LineToken) -> bool {
        match token {
            LineToken::Header { kind, .. } => self.header_accepted(frame, *kind),
            LineToken::TagLine => self
                .tag_target()
                .map_or(false, |kind| kind.is_taggable() && self.header_accepted(frame, kind)),
            LineToken::Step { .. } => match frame.level {
                Level::Background => true,
                Level::Scenario => !frame.has_examples,
                _ => false,
            },
            LineToken::TableRow => frame.level == Level::Examples && !frame.has_table,
            _ => false,
        }
    }

    fn top_accepts(&self, token: &LineToken) -> bool {
        self.frames
            .last()
            .map_or(false, |frame| self.frame_accepts(frame, token))
    }

    fn ancestors_accept(&self, token: &LineToken) -> bool {
        let open = self.frames.len().saturating_sub(1);
        self.frames[..open]
            .iter()
            .any(|frame| self.frame_accepts(frame, token))
    }

    fn expected(&self) -> String {
        let mut names: Vec<&str> = Vec::new();
        for frame in self.frames.iter().rev() {
            for name in frame.level.expects() {
                if !names.contains(name) {
                    names.push(name);
                }
            }
        }
        names.join(", ")
    }

    fn top_mut(&mut self) -> Option<&mut Frame> {
        self.frames.last_mut()
    }

    /// Returns the next line the innermost frame accepts. Closes the frame
    /// (returns `None`) when an enclosing frame wants the line, and skips
    /// lines nobody wants.
    fn next_structural(&mut self) -> Option<LineToken> {
        loop {
            self.consume_trivia_lines();
            if self.aborted {
                return None;
            }
            let token = self.peek()?;
            if self.top_accepts(&token) {
                return Some(token);
            }
            if self.ancestors_accept(&token) {
                return None;
            }
            self.skip_line(&token);
        }
    }

    // ------------------------------------------------------------------
    // Diagnostics
    // ------------------------------------------------------------------

    /// Creates an error diagnostic, or nothing once parsing has stopped at an
    /// earlier error.
    fn diagnose(
        &mut self,
        descriptor: &'static DiagnosticDescriptor,
        arguments: Vec<String>,
    ) -> Option<InternalDiagnostic> {
        if self.aborted {
            return None;
        }
        self.errors += 1;
        if self.stop_at_first_error {
            debug!(id = descriptor.id, "stopping at first error");
            self.aborted = true;
        }
        Some(InternalDiagnostic::new(descriptor, arguments))
    }

    // ------------------------------------------------------------------
    // Token assembly
    // ------------------------------------------------------------------

    /// Turns a line's pieces into tokens. Trivia before the first token joins
    /// the pending buffer; trivia after a token is its trailing trivia.
    fn assemble(&mut self, pieces: Vec<Piece>) -> Vec<RawNode> {
        let mut built: Vec<(Piece, Vec<RawNode>, Vec<RawNode>)> = Vec::new();
        for piece in pieces {
            if piece.kind.is_trivia() {
                let trivia = RawNode::trivia(piece.kind, &self.text[piece.start..piece.end])
                    .with_diagnostics(piece.diagnostics);
                match built.last_mut() {
                    Some((_, _, trailing)) => trailing.push(trivia),
                    None => self.pending.push(trivia),
                }
            } else {
                let leading = mem::take(&mut self.pending);
                built.push((piece, leading, Vec::new()));
            }
        }
        built
            .into_iter()
            .map(|(piece, leading, trailing)| self.make_token(piece, leading, trailing))
            .collect()
    }

    fn make_token(&self, piece: Piece, leading: Vec<RawNode>, trailing: Vec<RawNode>) -> RawNode {
        let leading = RawNode::list(leading);
        let trailing = RawNode::list(trailing);
        let token = if piece.missing {
            RawNode::missing_token(piece.kind, leading, trailing)
        } else {
            RawNode::token_with_value(
                piece.kind,
                &self.text[piece.start..piece.end],
                piece.value,
                leading,
                trailing,
            )
        };
        token.with_diagnostics(piece.diagnostics)
    }

    /// Assembles the current line and moves past it.
    fn take_line(&mut self, pieces: Vec<Piece>) -> Vec<RawNode> {
        self.next += 1;
        self.assemble(pieces)
    }

    fn end_of_file(&mut self) -> RawNode {
        let leading = RawNode::list(mem::take(&mut self.pending));
        RawNode::token(SyntaxKind::EndOfFileToken, "", leading, None)
    }

    // ------------------------------------------------------------------
    // Trivia lines
    // ------------------------------------------------------------------

    fn consume_trivia_lines(&mut self) {
        while let Some(token) = self.peek() {
            match token {
                LineToken::Empty => self.trivia_line(SyntaxKind::CommentTrivia, None),
                LineToken::Comment => self.trivia_line(SyntaxKind::CommentTrivia, None),
                LineToken::Language(language) if !self.feature_seen => {
                    self.switch_language(&language)
                }
                LineToken::Language(_) => self.trivia_line(SyntaxKind::CommentTrivia, None),
                _ => break,
            }
        }
    }

    fn trivia_line(&mut self, kind: SyntaxKind, diagnostic: Option<InternalDiagnostic>) {
        let Some(line) = self.current_line() else {
            return;
        };
        let mut cursor = LineCursor::new(self.text, &line);
        cursor.whitespace();
        if let Some(piece) = cursor.rest_trimmed(kind) {
            piece.diagnose(diagnostic);
        }
        let pieces = cursor.finish();
        self.take_line(pieces);
    }

    /// Where the tag of the directive on the current line sits.
    fn language_location(&self, language: &str) -> Location {
        let line = self.current_line().unwrap_or(TextLine {
            start: self.text.len(),
            end: self.text.len(),
            end_including_break: self.text.len(),
        });
        let offset = self.text[line.start..line.end].rfind(language).unwrap_or(0);
        let span = TextSpan::new(line.start + offset, language.len());
        let column = self.text[line.start..span.start].chars().count();
        Location {
            path: self.path.clone(),
            span,
            line_span: LinePositionSpan {
                start: LinePosition::new(self.next, column),
                end: LinePosition::new(self.next, column + language.chars().count()),
            },
        }
    }

    fn switch_language(&mut self, language: &str) {
        let source = to_error_source(&self.path, self.text);
        let location = self.language_location(language);
        match self.provider.get_dialect_in(language, &source, &location) {
            Ok(dialect) => {
                debug!(language, "switching dialect");
                self.matcher = TokenMatcher::new(dialect);
                self.trivia_line(SyntaxKind::LanguageDirectiveTrivia, None);
            }
            Err(error) => {
                debug!("{:?}", miette::Report::new(error));
                let diagnostic = self.diagnose(&UNKNOWN_LANGUAGE, vec![language.to_string()]);
                self.trivia_line(SyntaxKind::LanguageDirectiveTrivia, diagnostic);
            }
        }
    }

    // ------------------------------------------------------------------
    // Recovery
    // ------------------------------------------------------------------

    fn skip_line(&mut self, token: &LineToken) {
        let Some(line) = self.current_line() else {
            return;
        };
        let shown = self.content(&line).trim_end_matches(is_space).to_string();
        let diagnostic = if *token == LineToken::TagLine {
            self.diagnose(
                &DANGLING_TAGS,
                vec!["a Feature, Rule, Scenario or Examples header".to_string()],
            )
        } else {
            let expected = self.expected();
            self.diagnose(&UNEXPECTED_LINE, vec![shown, expected])
        };
        trace!(line = self.next + 1, "skipping line");
        let mut cursor = LineCursor::new(self.text, &line);
        cursor.whitespace();
        if let Some(piece) = cursor.rest_trimmed(SyntaxKind::SkippedTokensTrivia) {
            piece.diagnose(diagnostic);
        }
        let pieces = cursor.finish();
        self.take_line(pieces);
    }

    /// Folds every remaining line into trivia for the end-of-file token.
    fn skip_rest(&mut self) {
        while let Some(token) = self.peek() {
            if token.is_trivia() {
                self.trivia_line(SyntaxKind::CommentTrivia, None);
                continue;
            }
            if let Some(line) = self.current_line() {
                let mut cursor = LineCursor::new(self.text, &line);
                cursor.whitespace();
                cursor.rest_trimmed(SyntaxKind::SkippedTokensTrivia);
                let pieces = cursor.finish();
                self.take_line(pieces);
            }
        }
    }

    // ------------------------------------------------------------------
    // Grammar
    // ------------------------------------------------------------------

    fn parse_document(mut self) -> RawNode {
        self.frames.push(Frame::new(Level::Document));
        let mut feature = None;
        while let Some(token) = self.next_structural() {
            match token {
                LineToken::Header { .. } => {
                    self.feature_seen = true;
                    feature = Some(self.parse_feature(None));
                }
                LineToken::TagLine => {
                    self.feature_seen = true;
                    let tags = self.parse_tags();
                    feature = Some(self.parse_feature(tags));
                }
                other => self.skip_line(&other),
            }
        }
        self.skip_rest();
        let eof = self.end_of_file();
        debug!(errors = self.errors, aborted = self.aborted, "parsed feature text");
        build(
            SyntaxKind::GherkinDocument,
            slots::document::COUNT,
            [
                (slots::document::FEATURE, feature),
                (slots::document::END_OF_FILE, Some(eof)),
            ],
        )
    }

    fn parse_feature(&mut self, tags: Option<RawNode>) -> RawNode {
        let header = self.header_line();
        self.frames.push(Frame::new(Level::Feature));
        let description = self.parse_description();
        let mut background = None;
        let mut children = Vec::new();
        while let Some(token) = self.next_structural() {
            match token {
                LineToken::Header {
                    kind: HeaderKind::Background,
                    ..
                } => {
                    self.mark(|f| f.has_background = true);
                    background = Some(self.parse_background());
                }
                LineToken::Header {
                    kind: HeaderKind::Rule,
                    ..
                } => {
                    self.mark(|f| f.has_children = true);
                    children.push(self.parse_rule(None));
                }
                LineToken::Header { .. } => {
                    self.mark(|f| f.has_children = true);
                    children.push(self.parse_scenario(None));
                }
                LineToken::TagLine => {
                    self.mark(|f| f.has_children = true);
                    let is_rule = self.tag_target() == Some(HeaderKind::Rule);
                    let tags = self.parse_tags();
                    children.push(if is_rule {
                        self.parse_rule(tags)
                    } else {
                        self.parse_scenario(tags)
                    });
                }
                other => self.skip_line(&other),
            }
        }
        self.frames.pop();
        use slots::feature::*;
        build(
            SyntaxKind::Feature,
            COUNT,
            [
                (TAGS, tags),
                (KEYWORD, header.keyword),
                (COLON, header.colon),
                (NAME, header.name),
                (DESCRIPTION, description),
                (BACKGROUND, background),
                (CHILDREN, RawNode::list(children)),
            ],
        )
    }

    fn parse_rule(&mut self, tags: Option<RawNode>) -> RawNode {
        let header = self.header_line();
        self.frames.push(Frame::new(Level::Rule));
        let description = self.parse_description();
        let mut background = None;
        let mut children = Vec::new();
        while let Some(token) = self.next_structural() {
            match token {
                LineToken::Header {
                    kind: HeaderKind::Background,
                    ..
                } => {
                    self.mark(|f| f.has_background = true);
                    background = Some(self.parse_background());
                }
                LineToken::Header { .. } => {
                    self.mark(|f| f.has_children = true);
                    children.push(self.parse_scenario(None));
                }
                LineToken::TagLine => {
                    self.mark(|f| f.has_children = true);
                    let tags = self.parse_tags();
                    children.push(self.parse_scenario(tags));
                }
                other => self.skip_line(&other),
            }
        }
        self.frames.pop();
        use slots::feature::*;
        build(
            SyntaxKind::Rule,
            COUNT,
            [
                (TAGS, tags),
                (KEYWORD, header.keyword),
                (COLON, header.colon),
                (NAME, header.name),
                (DESCRIPTION, description),
                (BACKGROUND, background),
                (CHILDREN, RawNode::list(children)),
            ],
        )
    }

    fn parse_background(&mut self) -> RawNode {
        let header = self.header_line();
        self.frames.push(Frame::new(Level::Background));
        let description = self.parse_description();
        let mut steps = Vec::new();
        while let Some(token) = self.next_structural() {
            match token {
                LineToken::Step {
                    keyword_len,
                    keyword_type,
                } => steps.push(self.parse_step(keyword_len, SyntaxKind::for_step_keyword(keyword_type))),
                other => self.skip_line(&other),
            }
        }
        self.frames.pop();
        use slots::background::*;
        build(
            SyntaxKind::Background,
            COUNT,
            [
                (KEYWORD, header.keyword),
                (COLON, header.colon),
                (NAME, header.name),
                (DESCRIPTION, description),
                (STEPS, RawNode::list(steps)),
            ],
        )
    }

    fn parse_scenario(&mut self, tags: Option<RawNode>) -> RawNode {
        let header = self.header_line();
        self.frames.push(Frame::new(Level::Scenario));
        let description = self.parse_description();
        let mut steps = Vec::new();
        let mut examples = Vec::new();
        while let Some(token) = self.next_structural() {
            match token {
                LineToken::Step {
                    keyword_len,
                    keyword_type,
                } => steps.push(self.parse_step(keyword_len, SyntaxKind::for_step_keyword(keyword_type))),
                LineToken::Header { .. } => {
                    self.mark(|f| f.has_examples = true);
                    examples.push(self.parse_examples(None));
                }
                LineToken::TagLine => {
                    self.mark(|f| f.has_examples = true);
                    let tags = self.parse_tags();
                    examples.push(self.parse_examples(tags));
                }
                other => self.skip_line(&other),
            }
        }
        self.frames.pop();
        use slots::scenario::*;
        build(
            SyntaxKind::Scenario,
            COUNT,
            [
                (TAGS, tags),
                (KEYWORD, header.keyword),
                (COLON, header.colon),
                (NAME, header.name),
                (DESCRIPTION, description),
                (STEPS, RawNode::list(steps)),
                (EXAMPLES, RawNode::list(examples)),
            ],
        )
    }

    fn parse_examples(&mut self, tags: Option<RawNode>) -> RawNode {
        let header = self.header_line();
        self.frames.push(Frame::new(Level::Examples));
        let description = self.parse_description();
        let mut table = None;
        while let Some(token) = self.next_structural() {
            match token {
                LineToken::TableRow => {
                    self.mark(|f| f.has_table = true);
                    table = Some(self.parse_data_table());
                }
                other => self.skip_line(&other),
            }
        }
        self.frames.pop();
        use slots::examples::*;
        build(
            SyntaxKind::Examples,
            COUNT,
            [
                (TAGS, tags),
                (KEYWORD, header.keyword),
                (COLON, header.colon),
                (NAME, header.name),
                (DESCRIPTION, description),
                (TABLE, table),
            ],
        )
    }

    fn mark(&mut self, update: impl FnOnce(&mut Frame)) {
        if let Some(frame) = self.top_mut() {
            update(frame);
        }
    }

    /// Reads the header line at the cursor. A header without its colon gets a
    /// missing colon token.
    fn header_line(&mut self) -> Header {
        let (Some(line), Some(LineToken::Header { kind, keyword_len, has_colon })) =
            (self.current_line(), self.peek())
        else {
            debug_assert!(false, "header_line called off a header");
            return Header {
                keyword: None,
                colon: None,
                name: None,
            };
        };
        let mut cursor = LineCursor::new(self.text, &line);
        cursor.whitespace();
        let keyword = cursor.rest()[..keyword_len].to_string();
        cursor.push(kind.keyword_kind(), keyword_len);
        if has_colon {
            cursor.push(SyntaxKind::ColonToken, 1);
        } else {
            let diagnostic = self.diagnose(&MISSING_COLON, vec![keyword]);
            cursor.missing(SyntaxKind::ColonToken, diagnostic);
        }
        cursor.whitespace();
        cursor.rest_trimmed(SyntaxKind::NameToken);
        let pieces = cursor.finish();
        let mut tokens = self.take_line(pieces).into_iter();
        Header {
            keyword: tokens.next(),
            colon: tokens.next(),
            name: tokens.next(),
        }
    }

    fn parse_tags(&mut self) -> Option<RawNode> {
        let mut tags = Vec::new();
        loop {
            self.consume_trivia_lines();
            if self.peek() != Some(LineToken::TagLine) {
                break;
            }
            tags.extend(self.tag_line());
        }
        Some(RawNode::node(SyntaxKind::Tags, vec![RawNode::list(tags)]))
    }

    fn tag_line(&mut self) -> Vec<RawNode> {
        let Some(line) = self.current_line() else {
            return Vec::new();
        };
        let mut cursor = LineCursor::new(self.text, &line);
        cursor.whitespace();
        loop {
            let rest = cursor.rest();
            if rest.trim_end_matches(is_space).is_empty() {
                break;
            }
            if rest.starts_with('#') {
                cursor.rest_trimmed(SyntaxKind::CommentTrivia);
                break;
            }
            let len = rest.find(is_space).unwrap_or(rest.len());
            if rest.starts_with('@') {
                cursor.push(SyntaxKind::TagToken, len);
            } else {
                let diagnostic =
                    self.diagnose(&UNEXPECTED_LINE, vec![rest[..len].to_string(), "a tag".to_string()]);
                cursor
                    .push(SyntaxKind::SkippedTokensTrivia, len)
                    .diagnose(diagnostic);
            }
            cursor.whitespace();
        }
        let pieces = cursor.finish();
        self.take_line(pieces)
    }

    fn parse_description(&mut self) -> Option<RawNode> {
        let mut lines = Vec::new();
        loop {
            self.consume_trivia_lines();
            if self.aborted {
                break;
            }
            let Some(token) = self.peek() else {
                break;
            };
            // Steps, tables, doc strings and misplaced headers are left for
            // the frame loop, which reports the ones nobody accepts.
            let is_text = matches!(
                token,
                LineToken::Other | LineToken::Header { has_colon: false, .. }
            );
            if !is_text {
                break;
            }
            let Some(line) = self.current_line() else {
                break;
            };
            let mut cursor = LineCursor::new(self.text, &line);
            cursor.whitespace();
            cursor.rest_trimmed(SyntaxKind::DescriptionTextToken);
            let pieces = cursor.finish();
            lines.extend(self.take_line(pieces));
        }
        RawNode::list(lines).map(|list| RawNode::node(SyntaxKind::Description, vec![Some(list)]))
    }

    fn parse_step(&mut self, keyword_len: usize, keyword_kind: SyntaxKind) -> RawNode {
        let mut tokens = Vec::new();
        if let Some(line) = self.current_line() {
            let mut cursor = LineCursor::new(self.text, &line);
            cursor.whitespace();
            cursor.push(keyword_kind, keyword_len);
            cursor.whitespace();
            cursor.rest_trimmed(SyntaxKind::StepTextToken);
            let pieces = cursor.finish();
            tokens = self.take_line(pieces);
        }
        let mut tokens = tokens.into_iter();
        let keyword = tokens.next();
        let text = tokens.next();

        self.consume_trivia_lines();
        let argument = if self.aborted {
            None
        } else {
            match self.peek() {
                Some(LineToken::TableRow) => Some(self.parse_data_table()),
                Some(LineToken::DocStringSeparator { delimiter }) => {
                    Some(self.parse_doc_string(delimiter))
                }
                _ => None,
            }
        };
        use slots::step::*;
        build(
            SyntaxKind::Step,
            COUNT,
            [(KEYWORD, keyword), (TEXT, text), (ARGUMENT, argument)],
        )
    }

    fn parse_data_table(&mut self) -> RawNode {
        let mut rows = Vec::new();
        let mut first_width = None;
        loop {
            if self.aborted || self.peek() != Some(LineToken::TableRow) {
                break;
            }
            let (row, cells) = self.table_row();
            let row = match first_width {
                None => {
                    first_width = Some(cells);
                    row
                }
                Some(expected) if expected != cells => {
                    let diagnostic = self.diagnose(
                        &INCONSISTENT_CELL_COUNT,
                        vec![cells.to_string(), expected.to_string()],
                    );
                    row.with_diagnostics(diagnostic.into_iter().collect())
                }
                Some(_) => row,
            };
            rows.push(row);
            self.consume_trivia_lines();
        }
        RawNode::node(SyntaxKind::DataTable, vec![RawNode::list(rows)])
    }

    /// Reads one table row. Returns the row node and its cell count.
    fn table_row(&mut self) -> (RawNode, usize) {
        let Some(line) = self.current_line() else {
            return (RawNode::node(SyntaxKind::TableRow, vec![None]), 0);
        };
        let mut cursor = LineCursor::new(self.text, &line);
        cursor.whitespace();
        let base = cursor.pos;
        let row = cursor.rest();
        let mut cells = 0;
        for lexeme in lex_row(row) {
            match lexeme {
                RowLexeme::Bar(r) => {
                    cursor.push(SyntaxKind::VerticalBarToken, r.len());
                }
                RowLexeme::Whitespace(r) => {
                    cursor.push(SyntaxKind::WhitespaceTrivia, r.len());
                }
                RowLexeme::Comment(r) => {
                    cursor.push(SyntaxKind::CommentTrivia, r.len());
                }
                RowLexeme::Cell(r) => {
                    cells += 1;
                    let value = TableLiteralEscaping::unescape(&row[r.clone()]);
                    cursor.push(SyntaxKind::TableLiteralToken, r.len()).value = Some(value);
                }
                RowLexeme::UnterminatedCell(r) => {
                    cells += 1;
                    let value = TableLiteralEscaping::unescape(&row[r.clone()]);
                    cursor.push(SyntaxKind::TableLiteralToken, r.len()).value = Some(value);
                    let diagnostic = self.diagnose(&UNTERMINATED_TABLE_ROW, Vec::new());
                    cursor.missing(SyntaxKind::VerticalBarToken, diagnostic);
                }
            }
            debug_assert!(cursor.pos <= base + row.len());
        }
        let pieces = cursor.finish();
        let tokens = self.take_line(pieces);
        (RawNode::node(SyntaxKind::TableRow, vec![RawNode::list(tokens)]), cells)
    }

    fn parse_doc_string(&mut self, delimiter: &'static str) -> RawNode {
        let Some(open_line) = self.current_line() else {
            return build(SyntaxKind::DocString, slots::doc_string::COUNT, []);
        };
        let indent = self.text[open_line.start..open_line.end]
            .chars()
            .take_while(|c| is_space(*c))
            .count();

        let mut cursor = LineCursor::new(self.text, &open_line);
        cursor.whitespace();
        cursor.push(SyntaxKind::DocStringDelimiterToken, delimiter.len());
        cursor.whitespace();
        cursor.rest_trimmed(SyntaxKind::DocStringMediaTypeToken);
        let pieces = cursor.finish();
        let mut tokens = self.take_line(pieces).into_iter();
        let open = tokens.next();
        let media_type = tokens.next();

        let mut content = Vec::new();
        let mut close = None;
        while let Some(line) = self.current_line() {
            let raw = &self.text[line.start..line.end];
            let mut cursor = LineCursor::new(self.text, &line);
            // Any line opening with the delimiter closes; the rest of it is
            // skipped, since only the opening line carries a media type.
            if raw.trim_start_matches(is_space).starts_with(delimiter) {
                cursor.whitespace();
                cursor.push(SyntaxKind::DocStringDelimiterToken, delimiter.len());
                let pieces = cursor.finish();
                close = self.take_line(pieces).into_iter().next();
                break;
            }
            let strip: usize = raw
                .chars()
                .take(indent)
                .take_while(|c| is_space(*c))
                .map(char::len_utf8)
                .sum();
            if strip > 0 {
                cursor.push(SyntaxKind::WhitespaceTrivia, strip);
            }
            let text = cursor.rest();
            let unescaped = unescape_doc_string_line(text, delimiter);
            let len = text.len();
            let piece = cursor.push(SyntaxKind::DocStringContentToken, len);
            if unescaped != text {
                piece.value = Some(unescaped);
            }
            let pieces = cursor.finish();
            content.extend(self.take_line(pieces));
        }

        let close = close.or_else(|| {
            let diagnostic = self.diagnose(&UNTERMINATED_DOC_STRING, vec![delimiter.to_string()]);
            let leading = RawNode::list(mem::take(&mut self.pending));
            Some(
                RawNode::missing_token(SyntaxKind::DocStringDelimiterToken, leading, None)
                    .with_diagnostics(diagnostic.into_iter().collect()),
            )
        });
        use slots::doc_string::*;
        build(
            SyntaxKind::DocString,
            COUNT,
            [
                (OPEN, open),
                (MEDIA_TYPE, media_type),
                (CONTENT, RawNode::list(content)),
                (CLOSE, close),
            ],
        )
    }
}
