//! File classification and parsing.
//!
//! Every traversed `.sql` file is classified by its leading directives and
//! parsed into a [`ParsedFile`]: a common envelope (original, cleaned, and
//! whitespace-stripped text plus content checksum) with one of three
//! structured payloads. Parsed files are ephemeral; they are recomputed on
//! every invocation and never persisted.

mod split;

pub use split::parse_split_statements;

use crate::error::{Error, Result};
use crate::normalize::{
    content_checksum, directive_payload, normalize_directives, strip_comments, strip_whitespace,
};
use crate::schema::{parse_create_table, TableDefinition};
use log::debug;
use std::fmt;

/// A source file delivered by the traversal: project-relative forward-slash
/// path plus textual content.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: String,
    pub text: String,
}

/// Directive keywords recognized in `-- sqlsync:` comments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    DeclarativeTable,
    SplitStatements,
    StartStatement,
    EndStatement,
    Critical,
}

impl Directive {
    /// Parse the first token of a directive payload.
    pub fn from_payload(payload: &str) -> Option<Self> {
        match payload.split_whitespace().next()? {
            "declarativeTable" => Some(Self::DeclarativeTable),
            "splitStatements" => Some(Self::SplitStatements),
            "startStatement" => Some(Self::StartStatement),
            "endStatement" => Some(Self::EndStatement),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }

    /// True for the two directives that decide a file's parser.
    pub fn is_type_directive(self) -> bool {
        matches!(self, Self::DeclarativeTable | Self::SplitStatements)
    }
}

/// How a file is tracked in snapshots and diffs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    DeclarativeTable,
    SplitStatements,
    FileContent,
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileType::DeclarativeTable => write!(f, "declarativeTable"),
            FileType::SplitStatements => write!(f, "splitStatements"),
            FileType::FileContent => write!(f, "fileContent"),
        }
    }
}

/// One delimited block of a `splitStatements` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitStatement {
    /// Checksum of the whitespace-stripped block.
    pub checksum: String,
    /// Block text as captured (cleaned lines between the markers).
    pub text: String,
}

/// Structured payload of a parsed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileKind {
    DeclarativeTable(TableDefinition),
    /// Blocks in file order; checksums are unique within the file.
    SplitStatements(Vec<SplitStatement>),
    FileContent {
        checksum: String,
    },
}

/// A classified and parsed source file.
#[derive(Debug, Clone)]
pub struct ParsedFile {
    /// Project-relative path, forward slashes.
    pub path: String,
    /// Text exactly as read.
    pub original: String,
    /// Directive-normalized text with non-directive comments removed.
    pub cleaned: String,
    /// Cleaned text with all whitespace removed; checksum input.
    pub stripped: String,
    /// Whole-file checksum (SHA-256 hex of `stripped`).
    pub checksum: String,
    /// File carried the `critical` directive.
    pub critical: bool,
    pub kind: FileKind,
}

impl ParsedFile {
    pub fn file_type(&self) -> FileType {
        match &self.kind {
            FileKind::DeclarativeTable(_) => FileType::DeclarativeTable,
            FileKind::SplitStatements(_) => FileType::SplitStatements,
            FileKind::FileContent { .. } => FileType::FileContent,
        }
    }

    /// The table definition, when this file is declarative.
    pub fn table(&self) -> Option<&TableDefinition> {
        match &self.kind {
            FileKind::DeclarativeTable(table) => Some(table),
            _ => None,
        }
    }
}

/// Result of the directive scan over a normalized file.
struct Classification {
    file_type: FileType,
    critical: bool,
    has_markers: bool,
}

/// Scan directives and enforce placement rules.
///
/// Type directives are only legal in the leading comment block; a second
/// type directive anywhere is an error. Marker and `critical` directives
/// may appear anywhere.
fn classify(path: &str, normalized: &str) -> Result<Classification> {
    let mut file_type: Option<FileType> = None;
    let mut critical = false;
    let mut has_markers = false;
    let mut leading = true;

    for (idx, line) in normalized.lines().enumerate() {
        if let Some(payload) = directive_payload(line) {
            match Directive::from_payload(payload) {
                Some(directive) if directive.is_type_directive() => {
                    if !leading {
                        return Err(Error::DirectivePlacement {
                            path: path.to_string(),
                            message: format!(
                                "type directive `{payload}` on line {} must appear in the leading comment block",
                                idx + 1
                            ),
                        });
                    }
                    if file_type.is_some() {
                        return Err(Error::DirectivePlacement {
                            path: path.to_string(),
                            message: format!(
                                "repeated type directive `{payload}` on line {}",
                                idx + 1
                            ),
                        });
                    }
                    file_type = Some(match directive {
                        Directive::DeclarativeTable => FileType::DeclarativeTable,
                        _ => FileType::SplitStatements,
                    });
                }
                Some(Directive::StartStatement) | Some(Directive::EndStatement) => {
                    has_markers = true;
                }
                Some(Directive::Critical) => critical = true,
                Some(_) => unreachable!(),
                None => debug!("{path}: ignoring unknown directive `{payload}`"),
            }
            continue;
        }
        let trimmed = line.trim();
        if !trimmed.is_empty() && !trimmed.starts_with("--") {
            leading = false;
        }
    }

    Ok(Classification {
        file_type: file_type.unwrap_or(FileType::FileContent),
        critical,
        has_markers,
    })
}

/// Classify and parse one source file.
pub fn parse_source_file(file: &SourceFile) -> Result<ParsedFile> {
    let normalized = normalize_directives(&file.text);
    let classification = classify(&file.path, &normalized)?;
    let cleaned = strip_comments(&normalized);
    let stripped = strip_whitespace(&cleaned);
    let checksum = content_checksum(&cleaned);

    let kind = match classification.file_type {
        FileType::FileContent => FileKind::FileContent {
            checksum: checksum.clone(),
        },
        FileType::DeclarativeTable => {
            FileKind::DeclarativeTable(parse_create_table(&file.path, &cleaned)?)
        }
        FileType::SplitStatements => {
            if !classification.has_markers {
                return Err(Error::SplitStatementsMissingMarkers {
                    path: file.path.clone(),
                });
            }
            FileKind::SplitStatements(parse_split_statements(&file.path, &cleaned)?)
        }
    };

    Ok(ParsedFile {
        path: file.path.clone(),
        original: file.text.clone(),
        cleaned,
        stripped,
        checksum,
        critical: classification.critical,
        kind,
    })
}

/// Parse an ordered traversal, failing on the first bad file.
pub fn parse_all(files: &[SourceFile]) -> Result<Vec<ParsedFile>> {
    files.iter().map(parse_source_file).collect()
}
