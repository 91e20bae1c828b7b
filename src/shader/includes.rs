//! Include Expansion
//!
//! GLSL has no `#include` of its own, so shader sources reference shared
//! chunks through `#include` / `#pragma include` directives that are resolved
//! textually before compilation. [`IncludeResolver`] rewrites a source string
//! into one self-contained compilation unit:
//!
//! - each directive line is replaced by the referenced file's (recursively
//!   expanded) source, bracketed by marker comments naming the file
//! - a file that fails to load is replaced by a failure marker; expansion
//!   itself never fails
//! - an include cycle is cut at the point of re-entry with a cycle marker
//! - `#pragma` directives other than `#pragma include` pass through untouched
//!
//! Directive arguments may be bare (`#include chunks/common.glsl`), quoted or
//! angle-bracketed; only quotes are stripped, and a missing closing quote is
//! tolerated. Referenced files are fetched through the host's
//! [`ShaderResourceLoader`], never the filesystem directly.

use rustc_hash::FxHashSet;

use crate::shader::loader::ShaderResourceLoader;

/// Line terminator used for inserted marker lines.
pub const END_OF_LINE: &str = "\n";

/// Inserted before an included file's content.
pub const START_OF_INCLUDE_MARKER: &str = "// Start of include code : ";

/// Inserted after an included file's content.
pub const END_OF_INCLUDE_MARKER: &str = "// End of include code : ";

/// Replaces a directive whose file could not be loaded.
pub const FAILED_LOAD_MARKER: &str = "// Failed to load include code : ";

/// Replaces a directive that re-enters a file already being expanded.
pub const CYCLIC_INCLUDE_MARKER: &str = "// Skipped cyclic include of : ";

/// Expands include directives in shader source.
///
/// Borrows the loader for the duration of the expansion; construct one per
/// batch of sources sharing a loader.
pub struct IncludeResolver<'a> {
    loader: &'a dyn ShaderResourceLoader,
}

impl<'a> IncludeResolver<'a> {
    #[must_use]
    pub fn new(loader: &'a dyn ShaderResourceLoader) -> Self {
        Self { loader }
    }

    /// Expand every `#include` / `#pragma include` directive in `source`.
    ///
    /// Always succeeds; load failures and cycles appear as inline markers in
    /// the result. The scan is strictly forward, so already-inserted content
    /// is never reprocessed.
    #[must_use]
    pub fn expand(&self, source: &str) -> String {
        let mut active = FxHashSet::default();
        self.expand_inner(source, &mut active)
    }

    fn expand_inner(&self, source: &str, active: &mut FxHashSet<String>) -> String {
        let mut code = source.to_string();
        let mut pos = 0;

        while let Some((directive_start, is_pragma)) = next_directive(&code, pos) {
            let end_of_line = code[directive_start..]
                .find(['\n', '\r'])
                .map(|i| directive_start + i);

            // Skip the directive keyword, then whitespace, to reach the argument.
            let after_keyword = directive_start + if is_pragma { "#pragma".len() } else { "#include".len() };
            let Some(mut arg_start) = skip_spaces(&code, after_keyword) else {
                break;
            };

            if is_pragma {
                // Unrelated pragmas pass through; resume after the line.
                if !code[arg_start..].starts_with("include") {
                    match end_of_line {
                        Some(eol) => {
                            pos = eol;
                            continue;
                        }
                        None => break,
                    }
                }
                let Some(next) = skip_spaces(&code, arg_start + "include".len()) else {
                    break;
                };
                arg_start = next;
            }

            let line_end = end_of_line.unwrap_or(code.len());
            let mut arg_len = line_end.saturating_sub(arg_start);
            if arg_len == 0 {
                // Nothing after the directive on this line, leave it alone.
                pos = arg_start;
                continue;
            }

            let bytes = code.as_bytes();
            while arg_len > 0 && matches!(bytes[arg_start + arg_len - 1], b' ' | b'\t') {
                arg_len -= 1;
            }

            // Strip one leading quote and, when present, its closing partner.
            if bytes[arg_start] == b'"' {
                if arg_len >= 2 && bytes[arg_start + arg_len - 1] == b'"' {
                    arg_len -= 2;
                } else {
                    arg_len -= 1;
                }
                arg_start += 1;
            }

            let filename = code[arg_start..arg_start + arg_len].to_string();

            // Drop the directive text; the original line terminator stays in
            // place after the inserted block.
            code.replace_range(directive_start..line_end, "");
            let mut insert_at = directive_start;

            if active.contains(&filename) {
                log::warn!("cyclic include of {filename:?} skipped");
                splice(&mut code, &mut insert_at, CYCLIC_INCLUDE_MARKER);
                splice(&mut code, &mut insert_at, &filename);
                splice(&mut code, &mut insert_at, END_OF_LINE);
            } else if let Some(included) = self.loader.load_shader_resource(&filename) {
                active.insert(filename.clone());
                let content = included.source.clone().unwrap_or_default();
                let expanded = self.expand_inner(&content, active);
                active.remove(&filename);

                splice(&mut code, &mut insert_at, START_OF_INCLUDE_MARKER);
                splice(&mut code, &mut insert_at, &filename);
                splice(&mut code, &mut insert_at, END_OF_LINE);
                splice(&mut code, &mut insert_at, &expanded);
                splice(&mut code, &mut insert_at, END_OF_INCLUDE_MARKER);
                splice(&mut code, &mut insert_at, &filename);
                splice(&mut code, &mut insert_at, END_OF_LINE);
            } else {
                log::warn!("failed to load include {filename:?}");
                splice(&mut code, &mut insert_at, FAILED_LOAD_MARKER);
                splice(&mut code, &mut insert_at, &filename);
                splice(&mut code, &mut insert_at, END_OF_LINE);
            }

            pos = insert_at;
        }

        code
    }
}

/// Leftmost `#pragma` or `#include` at or after `from`; `true` for pragma.
fn next_directive(code: &str, from: usize) -> Option<(usize, bool)> {
    let tail = &code[from..];
    let pragma = tail.find("#pragma").map(|i| from + i);
    let include = tail.find("#include").map(|i| from + i);
    match (pragma, include) {
        (Some(p), Some(i)) => {
            if i < p {
                Some((i, false))
            } else {
                Some((p, true))
            }
        }
        (Some(p), None) => Some((p, true)),
        (None, Some(i)) => Some((i, false)),
        (None, None) => None,
    }
}

/// First position at or after `pos` that is not a space or tab, or `None`
/// when the rest of the buffer is blank. Stops at line terminators.
fn skip_spaces(code: &str, mut pos: usize) -> Option<usize> {
    let bytes = code.as_bytes();
    while pos < bytes.len() && matches!(bytes[pos], b' ' | b'\t') {
        pos += 1;
    }
    (pos < bytes.len()).then_some(pos)
}

fn splice(code: &mut String, at: &mut usize, text: &str) {
    code.insert_str(*at, text);
    *at += text.len();
}
