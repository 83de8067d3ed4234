// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Text level splicing of chart manifests.
//!
//! Manifest templates mix YAML with Helm template tokens, e.g.,
//! `{{ include "appName" $ }}`, so they cannot be parsed and serialized again
//! without mangling them. Instead, the splicer treats the manifest as plain
//! text, locates a region by its boundary lines, and swaps in freshly
//! serialized YAML. Everything outside the region is kept byte for byte.
//!
//! # Regions
//!
//! A __spec block__ starts at a top-level `spec:` line, and runs over every
//! following line that is blank or indented. The first non-blank line at
//! column zero ends it, e.g., a `---` document separator.
//!
//! A __workloads section__ starts at a `workloads:` line, optionally followed
//! by an empty sequence marker `[]`. It runs over every following line that
//! is indented deeper than the key, or that is a sequence item at the key's
//! own indentation. Trailing blank lines are not part of the section.
//!
//! A manifest may hold several spec blocks, one per document. Sections are
//! placed into the block that already holds a `workloads:` line, or into the
//! last spec block when none does.

use regex::Regex;
use serde_yaml::{Mapping, Value};
use tracing::{debug, info};

const SPEC_START: &str = r"^spec:[ \t]*$";
const WORKLOADS_START: &str = r"^(?P<indent> *)workloads:[ \t]*(?P<empty>\[\])?[ \t]*$";

/// Replace workloads section of manifest with new workload array.
///
/// The serialized `workloads:` key keeps the indentation of the line it
/// replaces. If the manifest has no workloads section at all, the array is
/// appended to the spec block at an indentation of two spaces.
///
/// # Errors
///
/// - Return [`SpliceError::SectionNotFound`] if manifest has neither a
///   workloads section, nor a spec block to append one to.
/// - Return [`SpliceError::Serialize`] if workload array cannot be
///   serialized.
pub fn replace_workloads_section(manifest: &str, workloads: &[Value]) -> Result<String> {
    let lines = lines(manifest);
    let start = Regex::new(WORKLOADS_START)?;

    let Some((first, captures)) = lines
        .iter()
        .enumerate()
        .find_map(|(index, line)| start.captures(line.text).map(|caps| (index, caps)))
    else {
        info!("manifest has no workloads section, appending one to spec block");
        return append_to_spec_section(manifest, "workloads", &Value::Sequence(workloads.to_vec()), 2);
    };

    let indent = captures.name("indent").map_or(0, |m| m.as_str().len());
    let mut last = first;
    if captures.name("empty").is_none() {
        for (index, line) in lines.iter().enumerate().skip(first + 1) {
            if line.is_blank() {
                continue;
            }
            if !continues_section(line, indent) {
                break;
            }
            last = index;
        }
    }

    let section = serialize_section("workloads", &Value::Sequence(workloads.to_vec()), indent)?;
    let (from, to) = (lines[first].start, lines[last].end);
    debug!(
        "replacing workloads section at lines {}..={}",
        first + 1,
        last + 1
    );

    let mut spliced = String::with_capacity(manifest.len() + section.len());
    spliced.push_str(&manifest[..from]);
    spliced.push_str(&section);
    spliced.push_str(&manifest[to..]);
    Ok(spliced)
}

/// Insert `key: value` at the end of the manifest's spec block.
///
/// The serialized section is indented by `indent` spaces, and lands right
/// after the last non-blank line of the block. Blank lines that trail the
/// block stay where they are. The spec block is located fresh on every
/// call, so repeated calls for different keys stack up in call order.
///
/// Nothing happens if the spec block already holds `key` at the requested
/// indentation.
///
/// # Errors
///
/// - Return [`SpliceError::SectionNotFound`] if manifest has no spec block.
/// - Return [`SpliceError::Serialize`] if value cannot be serialized.
pub fn append_to_spec_section(
    manifest: &str,
    key: &str,
    value: &Value,
    indent: usize,
) -> Result<String> {
    let lines = lines(manifest);
    let block = locate_spec_block(&lines)?;

    let existing = Regex::new(&format!(r"^ {{{indent}}}{}:(\s|$)", regex::escape(key)))?;
    if lines[block.first..=block.last]
        .iter()
        .any(|line| existing.is_match(line.text))
    {
        info!("spec block already holds {key:?}, leaving manifest untouched");
        return Ok(manifest.to_string());
    }

    let section = serialize_section(key, value, indent)?;
    let anchor = &lines[block.last];
    debug!("appending {key:?} to spec block after line {}", block.last + 1);

    let mut spliced = String::with_capacity(manifest.len() + section.len() + 1);
    spliced.push_str(&manifest[..anchor.end]);
    if !manifest[..anchor.end].ends_with('\n') {
        spliced.push('\n');
    }
    spliced.push_str(&section);
    spliced.push_str(&manifest[anchor.end..]);
    Ok(spliced)
}

#[derive(Debug, Clone, Copy)]
struct Line<'a> {
    start: usize,
    end: usize,
    text: &'a str,
}

impl Line<'_> {
    fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    fn indent(&self) -> usize {
        self.text.len() - self.text.trim_start_matches(' ').len()
    }
}

#[derive(Debug, Clone, Copy)]
struct Block {
    first: usize,
    last: usize,
}

fn lines(text: &str) -> Vec<Line<'_>> {
    let mut start = 0;
    text.split_inclusive('\n')
        .map(|raw| {
            let line = Line {
                start,
                end: start + raw.len(),
                text: raw.trim_end_matches(|c: char| c == '\n' || c == '\r'),
            };
            start += raw.len();
            line
        })
        .collect()
}

fn continues_section(line: &Line<'_>, indent: usize) -> bool {
    let depth = line.indent();
    let item = line.text[depth..].starts_with("- ") || &line.text[depth..] == "-";
    depth > indent || (depth == indent && item)
}

fn continues_block(line: &Line<'_>) -> bool {
    line.is_blank() || line.indent() > 0
}

fn locate_spec_block(lines: &[Line<'_>]) -> Result<Block> {
    let start = Regex::new(SPEC_START)?;
    let workloads = Regex::new(WORKLOADS_START)?;

    let mut blocks = Vec::new();
    for (first, line) in lines.iter().enumerate() {
        if !start.is_match(line.text) {
            continue;
        }

        let mut last = first;
        for (index, line) in lines.iter().enumerate().skip(first + 1) {
            if !continues_block(line) {
                break;
            }
            if !line.is_blank() {
                last = index;
            }
        }
        blocks.push(Block { first, last });
    }

    let preferred = blocks.iter().find(|block| {
        lines[block.first..=block.last]
            .iter()
            .any(|line| workloads.is_match(line.text))
    });

    preferred
        .or(blocks.last())
        .copied()
        .ok_or_else(|| SpliceError::SectionNotFound("spec".into()))
}

fn serialize_section(key: &str, value: &Value, indent: usize) -> Result<String> {
    let mut section = Mapping::new();
    section.insert(key.into(), value.clone());
    let text = serde_yaml::to_string(&section)?;

    let pad = " ".repeat(indent);
    let indented = text
        .lines()
        .map(|line| match line.is_empty() {
            true => "\n".to_string(),
            false => format!("{pad}{line}\n"),
        })
        .collect();
    Ok(indented)
}

/// Manifest splicing error types.
#[derive(Debug, thiserror::Error)]
pub enum SpliceError {
    /// Manifest lacks the region to splice into.
    #[error("cannot locate {0:?} section in manifest")]
    SectionNotFound(String),

    /// Boundary pattern failed to compile.
    #[error(transparent)]
    Regex(#[from] regex::Error),

    /// New section cannot be serialized.
    #[error("failed to serialize manifest section")]
    Serialize(#[from] serde_yaml::Error),
}

/// Friendly result alias :3
pub type Result<T, E = SpliceError> = std::result::Result<T, E>;
