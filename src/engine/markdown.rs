//! Line-oriented markdown normalizer with cursor preservation.
//!
//! Normalization rules: heading and list marker spacing collapsed to one
//! space, bullet markers unified to `-`, trailing whitespace stripped
//! (two-space hard breaks kept), runs of blank lines collapsed to one,
//! exactly one trailing newline. Fenced code blocks are left alone unless
//! a fence plugin claims their language, in which case the interior is
//! reformatted wholesale. Markers indented past three columns are left
//! as-is; so are thematic breaks.
//!
//! Every run ends with a structural check: input and output are parsed
//! with pulldown-cmark and the rewrite is refused if the document
//! structure diverged (fence interiors excluded, since fence plugins may
//! rewrite them).

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};

use super::{FencePlugin, FormatEngine, FormatOutcome, FormatRequest, fences};
use crate::error::FormatError;
use crate::model::cursor::Position;

pub struct MarkdownEngine {
    fence_plugins: Vec<Box<dyn FencePlugin>>,
}

impl MarkdownEngine {
    /// Engine with the default fence plugin set.
    pub fn new() -> Self {
        Self::with_fence_plugins(fences::default_fence_plugins())
    }

    pub fn with_fence_plugins(fence_plugins: Vec<Box<dyn FencePlugin>>) -> Self {
        Self { fence_plugins }
    }
}

impl Default for MarkdownEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatEngine for MarkdownEngine {
    fn format_with_cursor(
        &self,
        request: FormatRequest<'_>,
    ) -> Result<FormatOutcome, FormatError> {
        let rewrite = self.normalize(request.text)?;
        verify_structure(request.text, &rewrite.text)?;
        let cursor_offset = rewrite.remap_cursor(request.text, request.cursor_offset);
        Ok(FormatOutcome {
            text: rewrite.text,
            cursor_offset,
        })
    }
}

/// Where each input line ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineFate {
    /// Emitted (possibly edited) as this output row.
    Kept(usize),
    /// Removed by blank-line collapsing.
    Dropped,
    /// Inside a fence interior a plugin rewrote; maps to the block's first
    /// output row.
    Replaced(usize),
}

/// An open fenced code block while walking the document.
struct Fence {
    delim: char,
    plugin: Option<usize>,
    interior_rows: Vec<usize>,
}

struct Rewrite {
    text: String,
    out_lines: Vec<String>,
    fates: Vec<LineFate>,
}

impl MarkdownEngine {
    fn normalize(&self, input: &str) -> Result<Rewrite, FormatError> {
        let input_lines = split_lines(input);
        let mut out: Vec<String> = Vec::new();
        let mut origins: Vec<Option<usize>> = Vec::new();
        let mut fates = vec![LineFate::Dropped; input_lines.len()];
        let mut fence: Option<Fence> = None;

        for (row, line) in input_lines.iter().enumerate() {
            let closing = fence
                .as_ref()
                .is_some_and(|state| is_fence_close(line, state.delim));
            if closing {
                if let Some(state) = fence.take() {
                    self.flush_fence(&state, &input_lines, &mut out, &mut origins, &mut fates)?;
                }
                fates[row] = LineFate::Kept(out.len());
                out.push(line.trim_end().to_string());
                origins.push(Some(row));
                continue;
            }

            if let Some(state) = fence.as_mut() {
                state.interior_rows.push(row);
                continue;
            }

            if let Some((delim, token)) = fence_open(line) {
                fates[row] = LineFate::Kept(out.len());
                out.push(line.trim_end().to_string());
                origins.push(Some(row));
                fence = Some(Fence {
                    delim,
                    plugin: self.fence_plugins.iter().position(|p| p.matches(&token)),
                    interior_rows: Vec::new(),
                });
                continue;
            }

            let normalized = normalize_line(line);
            if normalized.is_empty() {
                // collapse runs of blank lines; leading blanks vanish entirely
                let keep = matches!(out.last(), Some(prev) if !prev.is_empty());
                if keep {
                    fates[row] = LineFate::Kept(out.len());
                    out.push(String::new());
                    origins.push(Some(row));
                }
            } else {
                fates[row] = LineFate::Kept(out.len());
                out.push(normalized);
                origins.push(Some(row));
            }
        }

        // unterminated fence: emit the collected interior untouched
        if let Some(state) = fence.take() {
            for &row in &state.interior_rows {
                fates[row] = LineFate::Kept(out.len());
                out.push(input_lines[row].clone());
                origins.push(Some(row));
            }
        }

        while matches!(out.last(), Some(last) if last.is_empty()) {
            out.pop();
            if let Some(Some(row)) = origins.pop() {
                fates[row] = LineFate::Dropped;
            }
        }

        let text = if out.is_empty() {
            String::new()
        } else {
            format!("{}\n", out.join("\n"))
        };

        Ok(Rewrite {
            text,
            out_lines: out,
            fates,
        })
    }

    fn flush_fence(
        &self,
        state: &Fence,
        input_lines: &[String],
        out: &mut Vec<String>,
        origins: &mut Vec<Option<usize>>,
        fates: &mut [LineFate],
    ) -> Result<(), FormatError> {
        let block_start = out.len();
        let source: String = state
            .interior_rows
            .iter()
            .map(|&row| input_lines[row].as_str())
            .collect::<Vec<_>>()
            .join("\n");

        if let Some(idx) = state.plugin
            && !source.trim().is_empty()
        {
            let formatted = self.fence_plugins[idx].format(&source)?;
            for fenced_line in formatted.lines() {
                out.push(fenced_line.to_string());
                origins.push(None);
            }
            for &row in &state.interior_rows {
                fates[row] = LineFate::Replaced(block_start);
            }
            return Ok(());
        }

        for &row in &state.interior_rows {
            fates[row] = LineFate::Kept(out.len());
            out.push(input_lines[row].clone());
            origins.push(Some(row));
        }
        Ok(())
    }
}

impl Rewrite {
    /// Map a char offset in the input to the equivalent offset in the
    /// output text.
    fn remap_cursor(&self, input: &str, offset: usize) -> usize {
        let input_lines = split_lines(input);
        let total_out = self.text.chars().count();
        if input_lines.is_empty() {
            return 0;
        }

        let pos = Position::from_offset(input, offset);
        if pos.row >= input_lines.len() {
            return total_out;
        }

        match self.fates[pos.row] {
            LineFate::Kept(out_row) => {
                let col = remap_col(&input_lines[pos.row], &self.out_lines[out_row], pos.col);
                self.out_line_start(out_row) + col
            }
            LineFate::Replaced(block_start) => self.out_line_start(block_start),
            LineFate::Dropped => {
                let next = self.fates[pos.row..].iter().find_map(|fate| match fate {
                    LineFate::Kept(out_row) => Some(*out_row),
                    LineFate::Replaced(block_start) => Some(*block_start),
                    LineFate::Dropped => None,
                });
                match next {
                    Some(out_row) => self.out_line_start(out_row),
                    None => total_out,
                }
            }
        }
    }

    /// Char offset of the start of an output row.
    fn out_line_start(&self, out_row: usize) -> usize {
        self.out_lines
            .iter()
            .take(out_row)
            .map(|line| line.chars().count() + 1)
            .sum()
    }
}

/// Map a column through an edited line using the unchanged prefix and
/// suffix; columns inside the edited middle clamp to its end.
fn remap_col(old: &str, new: &str, col: usize) -> usize {
    let old_chars: Vec<char> = old.chars().collect();
    let new_chars: Vec<char> = new.chars().collect();
    let col = col.min(old_chars.len());

    let prefix = old_chars
        .iter()
        .zip(&new_chars)
        .take_while(|(a, b)| a == b)
        .count();
    if col <= prefix {
        return col;
    }

    let max_suffix = old_chars.len().min(new_chars.len()) - prefix;
    let suffix = old_chars
        .iter()
        .rev()
        .zip(new_chars.iter().rev())
        .take_while(|(a, b)| a == b)
        .count()
        .min(max_suffix);

    let from_end = old_chars.len() - col;
    if from_end <= suffix {
        return new_chars.len() - from_end;
    }

    new_chars.len() - suffix
}

/// Split into lines, dropping the phantom entry after a trailing newline.
/// CR line endings are normalized away.
fn split_lines(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let mut lines: Vec<String> = text
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
        .collect();
    if text.ends_with('\n') {
        lines.pop();
    }
    lines
}

fn fence_open(line: &str) -> Option<(char, String)> {
    let trimmed = line.trim_start();
    for delim in ['`', '~'] {
        let run = trimmed.chars().take_while(|&c| c == delim).count();
        if run >= 3 {
            let token = trimmed[run..]
                .split_whitespace()
                .next()
                .unwrap_or("")
                .to_ascii_lowercase();
            return Some((delim, token));
        }
    }
    None
}

fn is_fence_close(line: &str, delim: char) -> bool {
    let trimmed = line.trim();
    trimmed.len() >= 3 && trimmed.chars().all(|c| c == delim)
}

fn normalize_line(line: &str) -> String {
    let body = line.trim_end();
    if body.is_empty() {
        return String::new();
    }

    let mut text = normalize_marker(body);
    if line.ends_with("  ") {
        // two trailing spaces are a hard line break, keep exactly two
        text.push_str("  ");
    }
    text
}

/// Normalize heading and list marker spacing.
fn normalize_marker(body: &str) -> String {
    let trimmed = body.trim_start();
    let indent = &body[..body.len() - trimmed.len()];

    if indent.is_empty() {
        let hashes = trimmed.chars().take_while(|&c| c == '#').count();
        if (1..=6).contains(&hashes) {
            let after = &trimmed[hashes..];
            if after.starts_with([' ', '\t']) {
                return format!("{} {}", &trimmed[..hashes], after.trim_start());
            }
        }
    }

    let shallow = indent.len() <= 3 && indent.chars().all(|c| c == ' ');
    if shallow && !is_thematic_break(trimmed) {
        if let Some(after) = trimmed.strip_prefix(['-', '*', '+'])
            && after.starts_with([' ', '\t'])
        {
            let item = after.trim_start();
            if !item.is_empty() {
                return format!("{indent}- {item}");
            }
        }

        let digits = trimmed.chars().take_while(char::is_ascii_digit).count();
        if digits > 0
            && let Some(tail) = trimmed[digits..].strip_prefix('.')
            && tail.starts_with([' ', '\t'])
        {
            let item = tail.trim_start();
            if !item.is_empty() {
                return format!("{indent}{}. {item}", &trimmed[..digits]);
            }
        }
    }

    body.to_string()
}

/// 3+ of one of `-` `_` `*`, optionally space-separated, nothing else.
fn is_thematic_break(trimmed: &str) -> bool {
    let mut kind = None;
    let mut count = 0;
    for c in trimmed.chars() {
        match c {
            ' ' | '\t' => {}
            '-' | '_' | '*' => {
                if *kind.get_or_insert(c) != c {
                    return false;
                }
                count += 1;
            }
            _ => return false,
        }
    }
    count >= 3
}

/// Refuse rewrites whose parsed structure differs from the input's.
fn verify_structure(before: &str, after: &str) -> Result<(), FormatError> {
    if signature(before) != signature(after) {
        return Err(FormatError::StructureChanged);
    }
    Ok(())
}

/// Event-level digest of a document. Text is compared with collapsed
/// whitespace and code block interiors are skipped.
fn signature(text: &str) -> Vec<String> {
    let mut sig = Vec::new();
    let mut text_run = String::new();
    let mut code_depth = 0usize;

    for event in Parser::new_ext(text, Options::empty()) {
        match event {
            Event::Text(chunk) => {
                if code_depth == 0 {
                    text_run.push_str(&chunk);
                }
            }
            Event::SoftBreak => {
                if code_depth == 0 {
                    text_run.push(' ');
                }
            }
            Event::Start(Tag::CodeBlock(_)) => {
                flush_text(&mut sig, &mut text_run);
                code_depth += 1;
                sig.push("start:codeblock".to_string());
            }
            Event::End(TagEnd::CodeBlock) => {
                code_depth = code_depth.saturating_sub(1);
                sig.push("end:codeblock".to_string());
            }
            Event::Start(tag) => {
                flush_text(&mut sig, &mut text_run);
                sig.push(format!("start:{tag:?}"));
            }
            Event::End(tag_end) => {
                flush_text(&mut sig, &mut text_run);
                sig.push(format!("end:{tag_end:?}"));
            }
            Event::HardBreak => {
                flush_text(&mut sig, &mut text_run);
                sig.push("break".to_string());
            }
            other => {
                flush_text(&mut sig, &mut text_run);
                sig.push(format!("{other:?}"));
            }
        }
    }
    flush_text(&mut sig, &mut text_run);
    sig
}

fn flush_text(sig: &mut Vec<String>, run: &mut String) {
    let collapsed = run.split_whitespace().collect::<Vec<_>>().join(" ");
    if !collapsed.is_empty() {
        sig.push(format!("text:{collapsed}"));
    }
    run.clear();
}
