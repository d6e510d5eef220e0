//! Edge lists in GraphViz text.
//!
//! Only edge statements carry information here. `A -> B`, `"A" -- "B"` and
//! chains such as `A -> B -> C` become link records; attributes in square
//! brackets become fields of every link in the statement. Node statements are
//! counted and otherwise ignored.

use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::error::IngestError;
use crate::store::{ImportBatch, RawRecord, SourceFormat};

lazy_static! {
    static ref BLOCK_COMMENT: Regex = Regex::new(r"(?s)/\*.*?\*/").unwrap();
    static ref LINE_COMMENT: Regex = Regex::new(r"(?m)^\s*(//|#).*$").unwrap();
    static ref EDGE_OP: Regex = Regex::new(r"\s*(->|--)\s*").unwrap();
    static ref ATTR_LIST: Regex = Regex::new(r"\[(.*)\]\s*$").unwrap();
    static ref ATTR: Regex =
        Regex::new(r#"([A-Za-z_][\w ]*?)\s*=\s*("(?:[^"\\]|\\.)*"|[^,;\s\]]+)"#).unwrap();
}

const KEYWORDS: [&str; 4] = ["graph", "node", "edge", "subgraph"];

pub fn load_path(path: &Path) -> Result<ImportBatch, IngestError> {
    let text = super::read_text(path)?;
    from_str(&text, &super::source_name(path))
}

fn unquote(raw: &str) -> String {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed)
        .replace("\\\"", "\"")
}

fn attributes(list: &str) -> Vec<(String, String)> {
    ATTR.captures_iter(list)
        .map(|cap| (cap[1].trim().to_string(), unquote(&cap[2])))
        .collect()
}

pub fn from_str(text: &str, source_name: &str) -> Result<ImportBatch, IngestError> {
    let text = BLOCK_COMMENT.replace_all(text, "");
    let text = LINE_COMMENT.replace_all(&text, "");
    let (Some(open), Some(close)) = (text.find('{'), text.rfind('}')) else {
        return Err(IngestError::NoGraph);
    };
    if close < open {
        return Err(IngestError::NoGraph);
    }
    let body = &text[open + 1..close];

    let mut records = Vec::new();
    let mut node_statements = 0;
    for statement in body.split([';', '\n']) {
        // `subgraph name { a -> b }` on one line keeps only what follows the brace
        let statement = statement.rsplit('{').next().unwrap_or(statement);
        let statement = statement.trim().trim_matches(|c| c == '{' || c == '}').trim();
        if statement.is_empty() {
            continue;
        }
        let first_word = statement
            .split(|c: char| c.is_whitespace() || c == '[')
            .next()
            .unwrap_or("");
        if KEYWORDS.contains(&first_word.to_ascii_lowercase().as_str()) {
            continue;
        }

        let (head, attrs) = match ATTR_LIST.captures(statement) {
            Some(cap) => {
                let start = cap.get(0).map(|m| m.start()).unwrap_or(statement.len());
                (&statement[..start], attributes(&cap[1]))
            }
            None => (statement, Vec::new()),
        };

        if !EDGE_OP.is_match(head) {
            if !head.contains('=') {
                node_statements += 1;
            }
            continue;
        }

        let ids: Vec<String> = EDGE_OP.split(head).map(unquote).collect();
        for pair in ids.windows(2) {
            let mut record: RawRecord = attrs.iter().map(|(k, v)| (k.as_str(), v.clone())).collect();
            record.insert("source_id", pair[0].clone());
            record.insert("destination_id", pair[1].clone());
            record.insert("data_source", source_name);
            record.insert("data_type", "link");
            records.push(record);
        }
    }

    debug!(
        "Parsed {} edges and ignored {} node statements in {}",
        records.len(),
        node_statements,
        source_name
    );

    Ok(ImportBatch {
        source_name: source_name.to_string(),
        format: SourceFormat::GraphDescription,
        records,
    })
}
