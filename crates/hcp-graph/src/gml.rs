//! Minimal GML reader covering the `graph [ node [...] edge [...] ]` subset.
//!
//! Nodes are renumbered densely in increasing `id` order. Edge `value`
//! attributes and any other keys are ignored. Directed graphs are rejected
//! because the likelihood model is defined on undirected pairs.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use hcp_core::errors::{ErrorInfo, HcpError};

use crate::network::AdjacencyGraph;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Key(String),
    Number(String),
    Text(String),
    Open,
    Close,
}

#[derive(Debug, Clone, PartialEq)]
enum Value {
    Number(String),
    Text(String),
    List(Vec<(String, Value)>),
}

/// Reads a GML file from disk.
pub fn read_gml(path: &Path) -> Result<AdjacencyGraph, HcpError> {
    let contents = fs::read_to_string(path).map_err(|err| HcpError::io("gml-read", path, err))?;
    parse_gml(&contents).map_err(|err| match err {
        HcpError::Graph(info) => {
            HcpError::Graph(info.with_context("path", path.display().to_string()))
        }
        other => other,
    })
}

/// Parses GML text into an [`AdjacencyGraph`].
pub fn parse_gml(text: &str) -> Result<AdjacencyGraph, HcpError> {
    let tokens = tokenize(text)?;
    let mut cursor = 0usize;
    let top = parse_list(&tokens, &mut cursor, false)?;
    let graph = top
        .into_iter()
        .find_map(|(key, value)| match (key.as_str(), value) {
            ("graph", Value::List(entries)) => Some(entries),
            _ => None,
        })
        .ok_or_else(|| HcpError::Graph(ErrorInfo::new("gml-no-graph", "no graph [ ... ] block")))?;

    let mut nodes: BTreeMap<i64, Option<String>> = BTreeMap::new();
    let mut raw_edges = Vec::new();
    for (key, value) in graph {
        match (key.as_str(), value) {
            ("directed", Value::Number(flag)) => {
                if parse_int(&flag, "directed")? != 0 {
                    return Err(HcpError::Graph(
                        ErrorInfo::new("gml-directed", "directed networks are not supported")
                            .with_hint("set `directed 0` or symmetrise the input"),
                    ));
                }
            }
            ("node", Value::List(entries)) => {
                let id = required_int(&entries, "id", "node")?;
                let label = entries.iter().find_map(|(k, v)| match (k.as_str(), v) {
                    ("label", Value::Text(text)) | ("label", Value::Number(text)) => {
                        Some(text.clone())
                    }
                    _ => None,
                });
                if nodes.insert(id, label).is_some() {
                    return Err(HcpError::Graph(
                        ErrorInfo::new("gml-duplicate-node", "node id declared twice")
                            .with_context("id", id.to_string()),
                    ));
                }
            }
            ("edge", Value::List(entries)) => {
                let source = required_int(&entries, "source", "edge")?;
                let target = required_int(&entries, "target", "edge")?;
                raw_edges.push((source, target));
            }
            _ => {}
        }
    }

    let index: BTreeMap<i64, usize> = nodes
        .keys()
        .enumerate()
        .map(|(dense, &id)| (id, dense))
        .collect();
    let mut edges = Vec::with_capacity(raw_edges.len());
    for (source, target) in raw_edges {
        let lookup = |id: i64| {
            index.get(&id).copied().ok_or_else(|| {
                HcpError::Graph(
                    ErrorInfo::new("gml-unknown-node", "edge references an undeclared node")
                        .with_context("id", id.to_string()),
                )
            })
        };
        edges.push((lookup(source)?, lookup(target)?));
    }
    let labels = nodes.into_values().collect::<Vec<_>>();
    let graph = AdjacencyGraph::from_edges(labels.len(), &edges)?.with_labels(labels);
    log::debug!(
        "parsed gml network with {} nodes and {} edges",
        graph.labels().len(),
        edges.len()
    );
    Ok(graph)
}

fn tokenize(text: &str) -> Result<Vec<Token>, HcpError> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();
    while let Some(&(start, ch)) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
        } else if ch == '#' {
            // comment until end of line
            while let Some((_, c)) = chars.next() {
                if c == '\n' {
                    break;
                }
            }
        } else if ch == '[' {
            chars.next();
            tokens.push(Token::Open);
        } else if ch == ']' {
            chars.next();
            tokens.push(Token::Close);
        } else if ch == '"' {
            chars.next();
            let mut text = String::new();
            let mut closed = false;
            for (_, c) in chars.by_ref() {
                if c == '"' {
                    closed = true;
                    break;
                }
                text.push(c);
            }
            if !closed {
                return Err(HcpError::Graph(
                    ErrorInfo::new("gml-unterminated-string", "string literal never closed")
                        .with_context("offset", start.to_string()),
                ));
            }
            tokens.push(Token::Text(text));
        } else {
            let mut word = String::new();
            while let Some(&(_, c)) = chars.peek() {
                if c.is_whitespace() || c == '[' || c == ']' || c == '"' {
                    break;
                }
                word.push(c);
                chars.next();
            }
            let numeric = word
                .chars()
                .next()
                .map(|c| c.is_ascii_digit() || c == '-' || c == '+' || c == '.')
                .unwrap_or(false);
            if numeric {
                tokens.push(Token::Number(word));
            } else {
                tokens.push(Token::Key(word));
            }
        }
    }
    Ok(tokens)
}

fn parse_list(
    tokens: &[Token],
    cursor: &mut usize,
    nested: bool,
) -> Result<Vec<(String, Value)>, HcpError> {
    let mut entries = Vec::new();
    loop {
        let Some(token) = tokens.get(*cursor) else {
            if nested {
                return Err(HcpError::Graph(ErrorInfo::new(
                    "gml-unbalanced",
                    "missing closing bracket",
                )));
            }
            return Ok(entries);
        };
        *cursor += 1;
        let key = match token {
            Token::Close if nested => return Ok(entries),
            Token::Key(key) => key.clone(),
            other => {
                return Err(HcpError::Graph(
                    ErrorInfo::new("gml-syntax", "expected a key")
                        .with_context("found", format!("{other:?}"))
                        .with_context("token", (*cursor - 1).to_string()),
                ))
            }
        };
        let value = match tokens.get(*cursor) {
            Some(Token::Open) => {
                *cursor += 1;
                Value::List(parse_list(tokens, cursor, true)?)
            }
            Some(Token::Number(number)) => {
                *cursor += 1;
                Value::Number(number.clone())
            }
            Some(Token::Text(text)) => {
                *cursor += 1;
                Value::Text(text.clone())
            }
            // bare words are accepted as string values
            Some(Token::Key(word)) => {
                *cursor += 1;
                Value::Text(word.clone())
            }
            _ => {
                return Err(HcpError::Graph(
                    ErrorInfo::new("gml-syntax", "key without a value").with_context("key", key),
                ))
            }
        };
        entries.push((key, value));
    }
}

fn required_int(entries: &[(String, Value)], key: &str, block: &str) -> Result<i64, HcpError> {
    match entries.iter().find(|(k, _)| k == key) {
        Some((_, Value::Number(number))) => parse_int(number, key),
        _ => Err(HcpError::Graph(
            ErrorInfo::new("gml-missing-field", "required integer field is missing")
                .with_context("block", block)
                .with_context("field", key),
        )),
    }
}

fn parse_int(number: &str, key: &str) -> Result<i64, HcpError> {
    number.parse::<i64>().map_err(|err| {
        HcpError::Graph(
            ErrorInfo::new("gml-invalid-integer", err.to_string())
                .with_context("field", key)
                .with_context("value", number),
        )
    })
}
