//! Declaration scanning over GLSL source
//!
//! Declarations are discovered line by line with a fixed grammar:
//!
//! ```text
//! attribute <type> <ident>;
//! uniform <type> <ident>;
//! uniform <type> <ident>, <ident>, ...;
//! ```
//!
//! Anything may follow the semicolon. Qualifiers, arrays and declarations
//! split across lines are not recognized.

use super::GlslType;

/// One discovered declaration
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Declaration {
    /// Declared type
    pub glsl_type: GlslType,
    /// Variable name
    pub name: String,
}

/// Split `s` after leading characters matching `pred`
fn take_while(s: &str, pred: impl Fn(char) -> bool) -> (&str, &str) {
    let end = s.find(|c: char| !pred(c)).unwrap_or(s.len());
    s.split_at(end)
}

/// `[A-Za-z_][A-Za-z0-9_]*` at the start of `s`
fn identifier(s: &str) -> Option<(&str, &str)> {
    if !s.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
        return None;
    }
    Some(take_while(s, |c| c.is_ascii_alphanumeric() || c == '_'))
}

/// `<keyword>\s+<type>\s+` prefix, returning the type name and the rest
fn declaration_head<'a>(line: &'a str, keyword: &str) -> Option<(&'a str, &'a str)> {
    let rest = line.trim_start().strip_prefix(keyword)?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let (type_name, rest) = take_while(rest.trim_start(), |c| c.is_ascii_alphanumeric());
    if type_name.is_empty() || !rest.starts_with(char::is_whitespace) {
        return None;
    }
    Some((type_name, rest.trim_start()))
}

/// Parse one declaration line; `allow_group` accepts comma-separated names
fn parse_declaration(line: &str, keyword: &str, allow_group: bool) -> Option<Vec<Declaration>> {
    let (type_name, mut rest) = declaration_head(line, keyword)?;
    let mut names = Vec::new();

    loop {
        let (name, after) = identifier(rest)?;
        names.push(name);
        rest = after.trim_start();

        match rest.chars().next()? {
            ';' => break,
            ',' if allow_group => rest = rest[1..].trim_start(),
            _ => return None,
        }
    }

    let glsl_type = GlslType::parse(type_name);
    Some(
        names
            .into_iter()
            .map(|name| Declaration { glsl_type: glsl_type.clone(), name: name.to_string() })
            .collect(),
    )
}

/// `attribute` declarations of a vertex shader, in source order
pub fn scan_attributes(source: &str) -> Vec<Declaration> {
    source
        .lines()
        .filter_map(|line| parse_declaration(line, "attribute", false))
        .flatten()
        .collect()
}

/// Append the `uniform` declarations of `source` to `found`
///
/// Entries already present with the same type and name are skipped, so the
/// stages of one program can be scanned into the same list.
pub fn scan_uniforms(source: &str, found: &mut Vec<Declaration>) {
    for declaration in source
        .lines()
        .filter_map(|line| parse_declaration(line, "uniform", true))
        .flatten()
    {
        if !found.contains(&declaration) {
            found.push(declaration);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(declarations: &[Declaration]) -> Vec<&str> {
        declarations.iter().map(|d| d.name.as_str()).collect()
    }

    #[test]
    fn test_attributes_in_source_order() {
        let source = "\
attribute vec3 inputPosition;
  attribute   vec3   inputNormal ; // trailing comment
attribute mat4;
varying vec3 normal;
";
        let attributes = scan_attributes(source);

        assert_eq!(names(&attributes), vec!["inputPosition", "inputNormal"]);
        assert!(attributes.iter().all(|a| a.glsl_type == GlslType::Vec3));
    }

    #[test]
    fn test_attribute_grammar_rejects_groups_and_qualifiers() {
        let source = "attribute vec3 a, b;\nattribute highp vec3 c;\nattributes vec3 d;\n";
        assert!(scan_attributes(source).is_empty());
    }

    #[test]
    fn test_uniform_group_yields_each_name() {
        let mut uniforms = Vec::new();
        scan_uniforms("uniform vec3 a, b, c;\n", &mut uniforms);

        assert_eq!(names(&uniforms), vec!["a", "b", "c"]);
        assert!(uniforms.iter().all(|u| u.glsl_type == GlslType::Vec3));
    }

    #[test]
    fn test_uniforms_deduplicated_across_stages() {
        let vertex = "uniform vec3 a, b, c;\nuniform mat4 projection;\nuniform vec3 a;\n";
        let fragment = "precision mediump float;\nuniform vec3 b;\nuniform vec3 c,a;\n";

        let mut uniforms = Vec::new();
        scan_uniforms(vertex, &mut uniforms);
        scan_uniforms(fragment, &mut uniforms);

        assert_eq!(names(&uniforms), vec!["a", "b", "c", "projection"]);
        assert_eq!(uniforms[3].glsl_type, GlslType::Mat4);
    }

    #[test]
    fn test_same_name_different_type_is_kept() {
        let mut uniforms = Vec::new();
        scan_uniforms("uniform vec3 tint;\nuniform vec4 tint;\n", &mut uniforms);
        assert_eq!(uniforms.len(), 2);
    }

    #[test]
    fn test_malformed_uniform_lines_are_ignored() {
        let mut uniforms = Vec::new();
        scan_uniforms("uniform vec3 a,;\nuniform vec3 1bad;\nuniform vec3 missing\n", &mut uniforms);
        assert!(uniforms.is_empty());
    }
}
