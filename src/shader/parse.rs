//! Line lexer for GLSL variable declarations.
//!
//! The binding system discovers its variable names from the shader source
//! text itself. Only top-level `attribute`, `uniform`, and `varying`
//! declarations matter; everything else (precision statements, function
//! bodies) is passed over. Declarations must be one statement per line —
//! `uniform float a, b;` is a parse error rather than a silent misparse.

use crate::error::Error;

/// The storage qualifier that opened a declaration line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Qualifier {
    /// Per-vertex input, bindable.
    Attribute,
    /// Per-draw-call input, bindable.
    Uniform,
    /// Interpolated stage-to-stage value; parsed but not bindable.
    Varying,
}

/// One discovered declaration: `<qualifier> <type> <name>;`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// Which registry the name belongs to.
    pub qualifier: Qualifier,
    /// The declared GLSL type, recorded for diagnostics only.
    pub ty: String,
    /// The declared variable name.
    pub name: String,
}

fn qualifier_for(token: &str) -> Option<Qualifier> {
    if token.eq_ignore_ascii_case("attribute") {
        Some(Qualifier::Attribute)
    } else if token.eq_ignore_ascii_case("uniform") {
        Some(Qualifier::Uniform)
    } else if token.eq_ignore_ascii_case("varying") {
        Some(Qualifier::Varying)
    } else {
        None
    }
}

/// Scan one stage's source for variable declarations.
///
/// Lines inside `/* ... */` block comments and lines starting with `//` are
/// skipped. The block-comment state is a single flag: it turns on at a `/*`
/// with no `*/` later on the same line, and off at the next line containing
/// `*/`.
///
/// # Errors
///
/// [`Error::ShaderParse`] when a declaration line is not exactly
/// `<qualifier> <type> <name>;` — a missing token, a missing trailing
/// semicolon, or a multi-declaration list.
pub fn scan_declarations(source: &str) -> Result<Vec<Declaration>, Error> {
    let mut declarations = Vec::new();
    let mut in_block_comment = false;

    for (index, raw_line) in source.lines().enumerate() {
        let line_no = index + 1;
        let line = raw_line.trim();

        if in_block_comment {
            if line.contains("*/") {
                in_block_comment = false;
            }
            continue;
        }
        if line.starts_with("//") {
            continue;
        }
        // A trailing line comment does not hide the declaration before it.
        let line = match line.find("//") {
            Some(pos) => line[..pos].trim_end(),
            None => line,
        };
        if let Some(open) = line.find("/*") {
            // A comment opened on this line hides any declaration on it;
            // track whether it closes before the line ends.
            in_block_comment = !line[open..].contains("*/");
            continue;
        }
        if line.is_empty() {
            continue;
        }

        let mut tokens = line.split_whitespace();
        let Some(first) = tokens.next() else {
            continue;
        };
        let Some(qualifier) = qualifier_for(first) else {
            continue;
        };

        declarations.push(parse_declaration(qualifier, line, first, line_no)?);
    }

    Ok(declarations)
}

/// Tokenize the remainder of a declaration line.
fn parse_declaration(
    qualifier: Qualifier,
    line: &str,
    keyword: &str,
    line_no: usize,
) -> Result<Declaration, Error> {
    let rest = line[keyword.len()..].trim();
    let Some(statement) = rest.strip_suffix(';') else {
        return Err(Error::ShaderParse {
            line: line_no,
            message: format!("declaration `{line}` is missing its trailing `;`"),
        });
    };

    let mut tokens = statement.split_whitespace();
    let Some(ty) = tokens.next() else {
        return Err(Error::ShaderParse {
            line: line_no,
            message: format!("declaration `{line}` has no type"),
        });
    };
    let Some(name) = tokens.next() else {
        return Err(Error::ShaderParse {
            line: line_no,
            message: format!("declaration `{line}` has no variable name"),
        });
    };
    if tokens.next().is_some() || name.contains(',') || ty.contains(',') {
        return Err(Error::ShaderParse {
            line: line_no,
            message: format!(
                "declaration `{line}` is not a single `<qualifier> <type> <name>;` statement"
            ),
        });
    }

    Ok(Declaration {
        qualifier,
        ty: ty.to_owned(),
        name: name.to_owned(),
    })
}
