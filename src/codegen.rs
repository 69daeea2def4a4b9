//! Instrumented source generation
//!
//! This module renders index calls, places the per-file index definition and
//! moves source text to and from disk.

use std::fs;
use std::path::Path;

use crate::error::{MutationError, Result};

/// Macro every inserted call uses to turn a file-local index into a global one
pub const MUTATION_INDEX_MACRO: &str = "MUTATION_INDEX";

/// Render the index argument passed to a replacement function
pub fn index_call(index: u64) -> String {
    format!("{}({})", MUTATION_INDEX_MACRO, index)
}

/// Render the definition that shifts a file's local indices by `offset`
pub fn index_definition(offset: u64) -> String {
    format!(
        "#define {}(offset) (offset + {})",
        MUTATION_INDEX_MACRO, offset
    )
}

fn is_include_line(line: &str) -> bool {
    let Some(directive) = line.trim_start().strip_prefix('#') else {
        return false;
    };
    let directive = directive.trim_start();
    directive.starts_with("include") || directive.starts_with("import")
}

/// Insert the index definition after the last include directive.
///
/// Files without an include directive get the definition on their first
/// line. The file's own line ending is reused.
pub fn insert_index_definition(source: &str, offset: u64) -> String {
    let newline = if source.contains("\r\n") { "\r\n" } else { "\n" };

    let mut insert_at = 0;
    let mut needs_break = false;
    let mut line_start = 0;
    for line in source.split_inclusive('\n') {
        let line_end = line_start + line.len();
        if is_include_line(line) {
            insert_at = line_end;
            needs_break = !line.ends_with('\n');
        }
        line_start = line_end;
    }

    let definition = index_definition(offset);
    let mut out = String::with_capacity(source.len() + definition.len() + 2 * newline.len());
    out.push_str(&source[..insert_at]);
    if needs_break {
        out.push_str(newline);
    }
    out.push_str(&definition);
    out.push_str(newline);
    out.push_str(&source[insert_at..]);
    out
}

/// Read a source file
pub fn read_source(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(MutationError::FileNotFound {
            file: path.to_path_buf(),
        });
    }

    fs::read_to_string(path).map_err(|e| MutationError::FileReadError {
        file: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Overwrite a source file, clearing a read-only attribute first
pub fn write_source(path: &Path, contents: &str) -> Result<()> {
    let to_write_error = |e: std::io::Error| MutationError::WriteError {
        file: path.to_path_buf(),
        error: e.to_string(),
    };

    clear_readonly(path).map_err(to_write_error)?;
    fs::write(path, contents).map_err(to_write_error)
}

/// Make an existing file writable; missing files are left alone
pub(crate) fn clear_readonly(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        return Ok(());
    }

    let mut permissions = fs::metadata(path)?.permissions();
    if permissions.readonly() {
        #[allow(clippy::permissions_set_readonly_false)]
        permissions.set_readonly(false);
        fs::set_permissions(path, permissions)?;
    }
    Ok(())
}
