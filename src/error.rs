//! The crate-wide error type.

use thiserror::Error;

use crate::api::ShaderStage;

/// Everything that can go wrong while parsing, binding, or rendering.
///
/// Compile, link, and parse failures are fatal to the shader program they
/// occur on; binding errors ([`Error::UnknownVariable`]) are recoverable by
/// the caller, e.g. by skipping the offending binding.
#[derive(Debug, Error)]
pub enum Error {
    /// A shader stage's source failed to compile.
    #[error("{stage} shader failed to compile: {info_log}")]
    ShaderCompile {
        /// Which stage rejected its source.
        stage: ShaderStage,
        /// The driver's info log for the failed compile.
        info_log: String,
    },

    /// The program failed to link after both stages were attached.
    #[error("shader program failed to link: {info_log}")]
    ShaderLink {
        /// The driver's info log for the failed link.
        info_log: String,
    },

    /// A declaration line in the shader source could not be tokenized.
    ///
    /// Declarations must be a single `<qualifier> <type> <name>;` statement
    /// per line; multi-declaration lines (`uniform float a, b;`) are
    /// rejected here rather than silently misparsed.
    #[error("shader parse error at line {line}: {message}")]
    ShaderParse {
        /// 1-based line number in the offending stage's source.
        line: usize,
        /// What went wrong on that line.
        message: String,
    },

    /// Data was bound to a variable name never declared in the parsed source.
    #[error("shader variable `{name}` was not declared in the program source")]
    UnknownVariable {
        /// The undeclared name.
        name: String,
    },

    /// The GPU refused to report a location for a declared, data-bound
    /// variable — usually because the compiler optimized it out.
    #[error("no location for shader variable `{name}`; it may have been optimized out")]
    UnresolvedLocation {
        /// The variable whose location could not be resolved.
        name: String,
    },

    /// A flat data payload whose length maps to no GPU upload call.
    #[error("data length {len} is not a vector (1-4) or matrix (9, 16) shape")]
    IncompatibleUniformLength {
        /// The rejected length.
        len: usize,
    },

    /// A GPU object (shader, program, buffer, texture) could not be created.
    #[error("graphics resource allocation failed: {0}")]
    Resource(String),

    /// A camera effect was started while another one is still running.
    #[error("a camera effect is already in progress")]
    EffectInProgress,

    /// Texture image data failed to decode.
    #[error("image decode failed: {0}")]
    Image(#[from] image::ImageError),

    /// Sprite-sheet atlas data failed to parse.
    #[error("atlas data parse failed: {0}")]
    AtlasData(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_variable() {
        let err = Error::UnknownVariable {
            name: "aMissing".into(),
        };
        assert!(err.to_string().contains("aMissing"));
    }

    #[test]
    fn display_names_the_stage() {
        let err = Error::ShaderCompile {
            stage: ShaderStage::Fragment,
            info_log: "0:1 syntax error".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("fragment"));
        assert!(msg.contains("syntax error"));
    }
}
