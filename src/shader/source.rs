//! The built-in shader pair every scene starts with.
//!
//! WebGL-1 style GLSL (`attribute`/`varying`, no `#version` directive) —
//! the dialect the declaration lexer discovers variables from. One
//! declaration per line, which is also the contract user shaders must
//! follow.

/// Default vertex shader.
///
/// # Variables
///
/// | Name        | Qualifier   | Type   | Description                      |
/// |-------------|-------------|--------|----------------------------------|
/// | `aPosition` | `attribute` | `vec2` | Vertex position in world units   |
/// | `aTexture`  | `attribute` | `vec2` | Texture coordinate               |
/// | `aColor`    | `attribute` | `vec4` | Per-vertex color                 |
/// | `camera`    | `uniform`   | `mat4` | View-projection matrix           |
/// | `modelview` | `uniform`   | `mat4` | Per-scene model transform        |
pub const DEFAULT_VERTEX_SOURCE: &str = "\
attribute vec2 aPosition;
attribute vec2 aTexture;
attribute vec4 aColor;
uniform mat4 camera;
uniform mat4 modelview;

varying vec2 vTexture;
varying vec4 vColor;

void main() {
    vTexture = aTexture;
    vColor = aColor;

    gl_Position = camera * modelview * vec4(aPosition, 0.0, 1.0);
}
";

/// Default fragment shader.
///
/// Samples the bound texture and modulates by the interpolated vertex
/// color and a scene-wide alpha.
///
/// # Variables
///
/// | Name       | Qualifier | Type        | Description                  |
/// |------------|-----------|-------------|------------------------------|
/// | `uSampler` | `uniform` | `sampler2D` | Texture unit 0               |
/// | `alpha`    | `uniform` | `float`     | Scene-wide opacity multiplier|
pub const DEFAULT_FRAGMENT_SOURCE: &str = "\
precision mediump float;

uniform sampler2D uSampler;
uniform float alpha;

varying vec2 vTexture;
varying vec4 vColor;

void main() {
    vec4 textureColor = texture2D(uSampler, vTexture);
    gl_FragColor = vec4(textureColor.rgb * vColor.rgb, textureColor.a * alpha);
}
";

/// Attribute name the default shader sources vertex positions from.
pub const DEFAULT_POSITION_ATTRIBUTE: &str = "aPosition";
/// Attribute name the default shader sources texture coordinates from.
pub const DEFAULT_TEXTURE_ATTRIBUTE: &str = "aTexture";
/// Attribute name the default shader sources vertex colors from.
pub const DEFAULT_COLOR_ATTRIBUTE: &str = "aColor";
/// Uniform name the default shader reads the camera matrix from.
pub const DEFAULT_CAMERA_UNIFORM: &str = "camera";
/// Uniform name the default shader reads the model transform from.
pub const DEFAULT_MODELVIEW_UNIFORM: &str = "modelview";
/// Uniform name the default shader reads the scene opacity from.
pub const DEFAULT_ALPHA_UNIFORM: &str = "alpha";

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::shader::parse::{scan_declarations, Qualifier};

    #[test]
    fn default_sources_lex_cleanly() {
        let vertex = scan_declarations(DEFAULT_VERTEX_SOURCE).unwrap();
        let fragment = scan_declarations(DEFAULT_FRAGMENT_SOURCE).unwrap();

        let attributes: Vec<_> = vertex
            .iter()
            .filter(|d| d.qualifier == Qualifier::Attribute)
            .map(|d| d.name.as_str())
            .collect();
        assert_eq!(
            attributes,
            [
                DEFAULT_POSITION_ATTRIBUTE,
                DEFAULT_TEXTURE_ATTRIBUTE,
                DEFAULT_COLOR_ATTRIBUTE
            ]
        );

        let uniforms: Vec<_> = fragment
            .iter()
            .filter(|d| d.qualifier == Qualifier::Uniform)
            .map(|d| d.name.as_str())
            .collect();
        assert_eq!(uniforms, ["uSampler", DEFAULT_ALPHA_UNIFORM]);
    }
}
