//! SyntaxKind enum for all tokens and nodes in the block document CST.
//!
//! Following the rust-analyzer model, all tokens and nodes share a single enum.
//! Every byte in the source must appear as a token in the tree.

/// All syntax kinds for the block document CST.
///
/// This enum represents both tokens (lexer output) and composite nodes (parser output).
/// The `repr(u16)` ensures efficient storage in rowan's green tree.
///
/// We use SCREAMING_CASE following the rust-analyzer convention for SyntaxKind.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(non_camel_case_types)]
pub enum SyntaxKind {
    // === Tokens (lexer output) ===
    /// Line feed
    NEWLINE,
    /// `∞∞∞` delimiter sentinel
    SENTINEL,
    /// Run of `[A-Za-z0-9_]` characters
    WORD,
    /// `-` (auto flag prefix, metadata keys and values)
    DASH,
    /// `;` metadata separator
    SEMICOLON,
    /// `=` between metadata key and value
    EQ,
    /// Anything else
    TEXT,
    /// End of file marker
    EOF,

    // === Composite Nodes (parser output) ===
    /// Root document node
    ROOT,
    /// One block: an optional delimiter followed by its content
    NOTE,
    /// Delimiter line including its leading and trailing newline
    DELIMITER,
    /// Language token inside a delimiter
    LANGUAGE,
    /// `-a` auto-detected marker
    AUTO_FLAG,
    /// `;key=value` entry
    METADATA,
    /// Metadata key
    METADATA_KEY,
    /// Metadata value (may be empty)
    METADATA_VALUE,
    /// Block body up to the next delimiter
    NOTE_CONTENT,
}

impl SyntaxKind {
    /// Returns true if this kind represents a token (lexer output).
    pub fn is_token(self) -> bool {
        (self as u16) <= (Self::EOF as u16)
    }

    /// Returns true if this kind represents a composite node.
    pub fn is_node(self) -> bool {
        !self.is_token()
    }
}

impl From<SyntaxKind> for rowan::SyntaxKind {
    fn from(kind: SyntaxKind) -> Self {
        Self(kind as u16)
    }
}

/// Language definition for rowan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BlockLang {}

impl rowan::Language for BlockLang {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        assert!(raw.0 <= SyntaxKind::NOTE_CONTENT as u16);
        // SAFETY: We check bounds above and SyntaxKind is repr(u16)
        unsafe { std::mem::transmute::<u16, SyntaxKind>(raw.0) }
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        kind.into()
    }
}

/// Type alias for our syntax nodes.
pub type SyntaxNode = rowan::SyntaxNode<BlockLang>;
/// Type alias for our syntax tokens.
pub type SyntaxToken = rowan::SyntaxToken<BlockLang>;
/// Type alias for syntax elements (node or token).
pub type SyntaxElement = rowan::SyntaxElement<BlockLang>;
