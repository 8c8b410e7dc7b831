//! CREATE TABLE parsing for declarative table files.
//!
//! The grammar is deliberately narrow: one `CREATE TABLE` per file, column
//! definitions split on top-level commas, constraint keywords recognized
//! case-insensitively at parenthesis depth zero. Anything beyond that is a
//! parse error rather than a guess.

use super::{Column, ForeignKeyRef, TableDefinition, DEFAULT_SCHEMA};
use crate::error::{Error, Result};
use crate::normalize::is_directive_line;
use once_cell::sync::Lazy;
use regex::Regex;

/// Regex for the statement head: `CREATE TABLE [IF NOT EXISTS] [schema.]name (`
static CREATE_TABLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?is)^\s*CREATE\s+TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?([A-Za-z_][\w$]*|"[^"]+")(?:\s*\.\s*([A-Za-z_][\w$]*|"[^"]+"))?\s*\("#,
    )
    .unwrap()
});

/// Inline REFERENCES clause with optional ON DELETE / ON UPDATE actions.
static REFERENCES_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)\bREFERENCES\s+([A-Za-z_][\w$]*(?:\s*\.\s*[A-Za-z_][\w$]*)?|"[^"]+")\s*\(\s*([A-Za-z_][\w$]*|"[^"]+")\s*\)((?:\s+ON\s+(?:DELETE|UPDATE)\s+(?:CASCADE|RESTRICT|NO\s+ACTION|SET\s+NULL|SET\s+DEFAULT))*)"#,
    )
    .unwrap()
});

/// One referential action inside the clause captured above.
static REF_ACTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bON\s+(DELETE|UPDATE)\s+(CASCADE|RESTRICT|NO\s+ACTION|SET\s+NULL|SET\s+DEFAULT)")
        .unwrap()
});

fn parse_error(path: &str, message: impl Into<String>) -> Error {
    Error::ParseCreateTable {
        path: path.to_string(),
        message: message.into(),
    }
}

/// Parse the single `CREATE TABLE` of a declarative file.
///
/// `text` is the cleaned file content (comments stripped, directives kept);
/// directive lines are ignored here.
pub fn parse_create_table(path: &str, text: &str) -> Result<TableDefinition> {
    let sql: String = text
        .lines()
        .filter(|line| !is_directive_line(line))
        .collect::<Vec<_>>()
        .join("\n");
    let sql = sql.trim();

    let caps = CREATE_TABLE_RE
        .captures(sql)
        .ok_or_else(|| parse_error(path, "expected a single CREATE TABLE statement"))?;

    let (schema, name) = match (caps.get(1), caps.get(2)) {
        (Some(first), Some(second)) => (
            unquote(first.as_str()).to_string(),
            unquote(second.as_str()).to_string(),
        ),
        (Some(first), None) => (
            DEFAULT_SCHEMA.to_string(),
            unquote(first.as_str()).to_string(),
        ),
        _ => return Err(parse_error(path, "missing table name")),
    };

    // The head regex ends on the opening parenthesis.
    let open = caps.get(0).unwrap().end() - 1;
    let (body, close) = extract_paren_group(sql, open)
        .ok_or_else(|| parse_error(path, "unbalanced parentheses in CREATE TABLE body"))?;

    let trailer = sql[close + 1..].trim();
    if !trailer.is_empty() && trailer != ";" {
        return Err(parse_error(
            path,
            "declarative files must contain exactly one CREATE TABLE statement",
        ));
    }

    let mut columns = Vec::new();
    for fragment in split_top_level(&body) {
        let fragment = fragment.trim();
        if fragment.is_empty() {
            continue;
        }
        if is_table_constraint(fragment) {
            continue;
        }
        columns.push(parse_column(path, fragment)?);
    }

    if columns.is_empty() {
        return Err(parse_error(path, "CREATE TABLE defines no columns"));
    }

    Ok(TableDefinition {
        schema,
        name,
        columns,
    })
}

/// Table-level constraint fragments are tracked as opaque file content, not
/// as column structure.
fn is_table_constraint(fragment: &str) -> bool {
    let upper = fragment.to_uppercase();
    ["PRIMARY KEY", "UNIQUE", "FOREIGN KEY", "CHECK", "CONSTRAINT"]
        .iter()
        .any(|kw| upper.starts_with(kw) && !is_word_char(upper.as_bytes().get(kw.len()).copied()))
}

/// Parse one column fragment of a CREATE TABLE body.
pub fn parse_column(path: &str, fragment: &str) -> Result<Column> {
    let fragment = fragment.trim();
    let (raw_name, rest) = split_identifier(fragment)
        .ok_or_else(|| parse_error(path, format!("cannot read column name in `{fragment}`")))?;
    let name = unquote(raw_name).to_string();
    let rest = rest.trim();

    let scan = DepthMap::new(rest);

    // The data type runs until the first top-level constraint keyword.
    let type_end = ["NOT NULL", "NULL", "DEFAULT", "PRIMARY KEY", "UNIQUE", "REFERENCES", "CHECK", "CONSTRAINT"]
        .iter()
        .filter_map(|kw| scan.find_keyword(kw).map(|m| m.0))
        .min()
        .unwrap_or(rest.len());
    let data_type = rest[..type_end].trim();
    if data_type.is_empty() {
        return Err(parse_error(
            path,
            format!("column `{name}` is missing a data type"),
        ));
    }

    let tail = &rest[type_end..];
    let scan = DepthMap::new(tail);

    let nullable = scan.find_keyword("NOT NULL").is_none();
    let primary_key = scan.find_keyword("PRIMARY KEY").is_some();
    let unique = scan.find_keyword("UNIQUE").is_some();
    let default = scan.find_keyword("DEFAULT").map(|(_, end)| {
        let expr_start = end;
        let expr_end = ["NOT NULL", "PRIMARY KEY", "UNIQUE", "REFERENCES", "CHECK", "CONSTRAINT"]
            .iter()
            .filter_map(|kw| scan.find_keyword_from(kw, expr_start).map(|m| m.0))
            .min()
            .unwrap_or(tail.len());
        tail[expr_start..expr_end].trim().to_string()
    });
    if let Some(expr) = &default {
        if expr.is_empty() {
            return Err(parse_error(
                path,
                format!("column `{name}` has DEFAULT with no expression"),
            ));
        }
    }

    let references = scan
        .find_keyword("REFERENCES")
        .and_then(|(start, _)| REFERENCES_RE.captures(&tail[start..]))
        .map(|caps| {
            let mut fk = ForeignKeyRef {
                table: unquote(caps.get(1).unwrap().as_str()).to_string(),
                column: unquote(caps.get(2).unwrap().as_str()).to_string(),
                on_delete: None,
                on_update: None,
            };
            for action in REF_ACTION_RE.captures_iter(caps.get(3).map_or("", |m| m.as_str())) {
                let verb = collapse_ws(action.get(2).unwrap().as_str()).to_uppercase();
                match action.get(1).unwrap().as_str().to_uppercase().as_str() {
                    "DELETE" => fk.on_delete = Some(verb),
                    _ => fk.on_update = Some(verb),
                }
            }
            fk
        });

    let check = match scan.find_keyword("CHECK") {
        Some((_, kw_end)) => {
            let open = tail[kw_end..]
                .find('(')
                .map(|i| kw_end + i)
                .ok_or_else(|| parse_error(path, format!("column `{name}` has CHECK without an expression")))?;
            let (expr, _) = extract_paren_group(tail, open).ok_or_else(|| {
                parse_error(path, format!("column `{name}` has an unbalanced CHECK expression"))
            })?;
            Some(expr.trim().to_string())
        }
        None => None,
    };

    Ok(Column {
        name,
        data_type: data_type.to_string(),
        nullable,
        default,
        primary_key,
        unique,
        references,
        check,
    })
}

/// First identifier of a fragment and the remainder. Handles `"name"` and
/// `` `name` `` quoting.
fn split_identifier(fragment: &str) -> Option<(&str, &str)> {
    let fragment = fragment.trim_start();
    let bytes = fragment.as_bytes();
    let first = *bytes.first()?;
    if first == b'"' || first == b'`' {
        let end = fragment[1..].find(first as char)? + 1;
        Some((&fragment[..=end], &fragment[end + 1..]))
    } else {
        let end = fragment
            .find(|c: char| c.is_whitespace())
            .unwrap_or(fragment.len());
        if end == 0 {
            return None;
        }
        Some((&fragment[..end], &fragment[end..]))
    }
}

fn unquote(ident: &str) -> &str {
    let ident = ident.trim();
    if (ident.starts_with('"') && ident.ends_with('"') && ident.len() >= 2)
        || (ident.starts_with('`') && ident.ends_with('`') && ident.len() >= 2)
    {
        &ident[1..ident.len() - 1]
    } else {
        ident
    }
}

fn collapse_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_word_char(b: Option<u8>) -> bool {
    matches!(b, Some(c) if c == b'_' || c == b'$' || c.is_ascii_alphanumeric())
}

/// Extract the content of the parenthesis group opening at `open`,
/// returning the inner text and the index of the closing parenthesis.
/// Single-quoted strings are honored (parens inside them do not count).
pub fn extract_paren_group(text: &str, open: usize) -> Option<(String, usize)> {
    let bytes = text.as_bytes();
    if bytes.get(open) != Some(&b'(') {
        return None;
    }
    let mut depth = 0i32;
    let mut in_string = false;
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        match b {
            b'\'' => in_string = !in_string,
            b'(' if !in_string => depth += 1,
            b')' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some((text[open + 1..i].to_string(), i));
                }
            }
            _ => {}
        }
    }
    None
}

/// Split on commas at parenthesis depth zero, outside string literals.
pub fn split_top_level(body: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut in_string = false;
    let mut start = 0usize;
    for (i, b) in body.bytes().enumerate() {
        match b {
            b'\'' => in_string = !in_string,
            b'(' if !in_string => depth += 1,
            b')' if !in_string => depth -= 1,
            b',' if !in_string && depth == 0 => {
                parts.push(body[start..i].to_string());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(body[start..].to_string());
    parts
}

/// Byte-indexed paren depth and string map for keyword searches that must
/// only match at the top level of a fragment.
struct DepthMap<'a> {
    text: &'a str,
    depth: Vec<i32>,
    in_string: Vec<bool>,
}

impl<'a> DepthMap<'a> {
    fn new(text: &'a str) -> Self {
        let mut depth = Vec::with_capacity(text.len());
        let mut in_string = Vec::with_capacity(text.len());
        let mut d = 0i32;
        let mut s = false;
        for b in text.bytes() {
            match b {
                b'\'' => {
                    in_string.push(true);
                    depth.push(d);
                    s = !s;
                    continue;
                }
                b'(' if !s => d += 1,
                b')' if !s => d -= 1,
                _ => {}
            }
            // The opening paren itself counts as inside the group.
            depth.push(if b == b')' && !s { d + 1 } else { d });
            in_string.push(s);
        }
        Self {
            text,
            depth,
            in_string,
        }
    }

    /// Position of `keyword` (multi-word, flexible whitespace) at depth
    /// zero outside strings; `(start, end)` byte offsets.
    fn find_keyword(&self, keyword: &str) -> Option<(usize, usize)> {
        self.find_keyword_from(keyword, 0)
    }

    fn find_keyword_from(&self, keyword: &str, from: usize) -> Option<(usize, usize)> {
        let re = keyword_regex(keyword);
        for m in re.find_iter(self.text) {
            if m.start() < from {
                continue;
            }
            let top_level = self
                .depth
                .get(m.start())
                .map_or(true, |d| *d == 0 && !self.in_string[m.start()]);
            if top_level {
                return Some((m.start(), m.end()));
            }
        }
        None
    }
}

static NOT_NULL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bNOT\s+NULL\b").unwrap());
static NULL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bNULL\b").unwrap());
static DEFAULT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bDEFAULT\b").unwrap());
static PRIMARY_KEY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bPRIMARY\s+KEY\b").unwrap());
static UNIQUE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bUNIQUE\b").unwrap());
static REFERENCES_KW_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bREFERENCES\b").unwrap());
static CHECK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bCHECK\b").unwrap());
static CONSTRAINT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bCONSTRAINT\b").unwrap());

fn keyword_regex(keyword: &str) -> &'static Regex {
    match keyword {
        "NOT NULL" => &NOT_NULL_RE,
        "NULL" => &NULL_RE,
        "DEFAULT" => &DEFAULT_RE,
        "PRIMARY KEY" => &PRIMARY_KEY_RE,
        "UNIQUE" => &UNIQUE_RE,
        "REFERENCES" => &REFERENCES_KW_RE,
        "CHECK" => &CHECK_RE,
        "CONSTRAINT" => &CONSTRAINT_RE,
        other => unreachable!("unregistered keyword {other}"),
    }
}
