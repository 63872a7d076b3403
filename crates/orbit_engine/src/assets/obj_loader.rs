//! OBJ geometry parser
//!
//! Supports the subset needed for a single triangulated mesh: `v`, `vn` and
//! three-corner `f` statements. Face corners may be a bare position index
//! (`f 1 2 3`), a position/normal pair (`f 1/1 2/2 3/3`) or a full
//! position/texcoord/normal triple (`f 1/1/1 2/2/2 3/3/3`, `f 1//1 2//2 3//3`).
//! The corner grammar is fixed by the first face line; texture coordinate
//! indices are parsed and dropped.

use crate::foundation::math::Vec3;
use std::path::Path;
use thiserror::Error;

/// Largest 1-based index that still fits a 16-bit 0-based index
const MAX_SOURCE_INDEX: u32 = u16::MAX as u32 + 1;

/// Geometry parsing errors
#[derive(Error, Debug)]
pub enum ObjError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A numeric token did not parse
    #[error("{name}:{line}: malformed number '{token}'")]
    MalformedNumber {
        /// Source name
        name: String,
        /// 1-based line number
        line: usize,
        /// Offending token
        token: String,
    },

    /// A statement had the wrong number of components
    #[error("{name}:{line}: expected {expected} components in '{keyword}' statement, found {found}")]
    Arity {
        /// Source name
        name: String,
        /// 1-based line number
        line: usize,
        /// Statement keyword
        keyword: &'static str,
        /// Expected component count
        expected: usize,
        /// Actual component count
        found: usize,
    },

    /// A face index does not fit 16 bits once converted to 0-based
    #[error("{name}:{line}: face index {index} exceeds the 16-bit index range")]
    IndexOutOfRange {
        /// Source name
        name: String,
        /// 1-based line number
        line: usize,
        /// Offending 1-based index
        index: u32,
    },

    /// A face line uses a different corner grammar than the first face line
    #[error("{name}:{line}: face format differs from the first face line ({expected:?} vs {found:?})")]
    InconsistentFaceFormat {
        /// Source name
        name: String,
        /// 1-based line number
        line: usize,
        /// Grammar of the first face line
        expected: FaceFormat,
        /// Grammar of this line
        found: FaceFormat,
    },
}

/// Corner grammar of face statements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceFormat {
    /// `p`
    Position,
    /// `p/n`
    PositionNormal,
    /// `p/t/n`
    PositionTextureNormal,
}

impl FaceFormat {
    fn of(corner: &str) -> Option<Self> {
        match corner.matches('/').count() {
            0 => Some(Self::Position),
            1 => Some(Self::PositionNormal),
            2 => Some(Self::PositionTextureNormal),
            _ => None,
        }
    }
}

/// Parsed geometry: flat component arrays and 0-based face index streams
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeometryFile {
    /// Source name used in diagnostics
    pub name: String,
    /// Position components, three per vertex
    pub positions: Vec<f32>,
    /// Normal components, three per normal
    pub normals: Vec<f32>,
    /// Position index per face corner
    pub position_indices: Vec<u16>,
    /// Normal index per face corner
    pub normal_indices: Vec<u16>,
    /// Grammar of the face lines, if any were present
    pub face_format: Option<FaceFormat>,
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Minimum corner
    pub min: Vec3,
    /// Maximum corner
    pub max: Vec3,
}

impl Bounds {
    /// Box center
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Edge lengths
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

struct LineContext<'a> {
    name: &'a str,
    line: usize,
}

impl LineContext<'_> {
    fn float(&self, token: &str) -> Result<f32, ObjError> {
        token.parse().map_err(|_| ObjError::MalformedNumber {
            name: self.name.to_string(),
            line: self.line,
            token: token.to_string(),
        })
    }

    /// Strict 1-based index to 0-based
    fn index(&self, token: &str) -> Result<u16, ObjError> {
        let value: u32 = token.parse().map_err(|_| ObjError::MalformedNumber {
            name: self.name.to_string(),
            line: self.line,
            token: token.to_string(),
        })?;
        self.checked_index(value)?.ok_or_else(|| ObjError::MalformedNumber {
            name: self.name.to_string(),
            line: self.line,
            token: token.to_string(),
        })
    }

    /// Lenient 1-based index: empty or malformed tokens are absent
    fn optional_index(&self, token: &str) -> Result<Option<u16>, ObjError> {
        match token.parse::<u32>() {
            Ok(value) => self.checked_index(value),
            Err(_) => Ok(None),
        }
    }

    fn checked_index(&self, value: u32) -> Result<Option<u16>, ObjError> {
        if value == 0 {
            return Ok(None);
        }
        if value > MAX_SOURCE_INDEX {
            return Err(ObjError::IndexOutOfRange {
                name: self.name.to_string(),
                line: self.line,
                index: value,
            });
        }
        Ok(u16::try_from(value - 1).ok())
    }

    fn arity(&self, keyword: &'static str, expected: usize, found: usize) -> ObjError {
        ObjError::Arity {
            name: self.name.to_string(),
            line: self.line,
            keyword,
            expected,
            found,
        }
    }
}

impl GeometryFile {
    /// Load and parse a geometry file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ObjError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        Self::parse(&path.display().to_string(), &text)
    }

    /// Parse geometry text; `name` only appears in diagnostics
    pub fn parse(name: &str, text: &str) -> Result<Self, ObjError> {
        let mut geometry = Self {
            name: name.to_string(),
            ..Self::default()
        };

        for (number, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let context = LineContext { name, line: number + 1 };
            let mut parts = line.split_whitespace();
            let Some(keyword) = parts.next() else {
                continue;
            };
            let components: Vec<&str> = parts.collect();

            match keyword {
                "v" => geometry.positions.extend(Self::parse_triple(&context, "v", &components)?),
                "vn" => geometry.normals.extend(Self::parse_triple(&context, "vn", &components)?),
                "f" => geometry.parse_face(&context, &components)?,
                // vt, o, g, s, usemtl, mtllib and friends carry nothing we draw
                _ => {}
            }
        }

        log::info!(
            "Parsed {}: {} positions, {} normals, {} faces",
            geometry.name,
            geometry.positions.len() / 3,
            geometry.normals.len() / 3,
            geometry.position_indices.len() / 3
        );

        Ok(geometry)
    }

    fn parse_triple(
        context: &LineContext<'_>,
        keyword: &'static str,
        components: &[&str],
    ) -> Result<[f32; 3], ObjError> {
        // a fourth (w) component is allowed and ignored
        if !(3..=4).contains(&components.len()) {
            return Err(context.arity(keyword, 3, components.len()));
        }
        Ok([
            context.float(components[0])?,
            context.float(components[1])?,
            context.float(components[2])?,
        ])
    }

    fn parse_face(&mut self, context: &LineContext<'_>, corners: &[&str]) -> Result<(), ObjError> {
        if corners.len() != 3 {
            return Err(context.arity("f", 3, corners.len()));
        }

        let found = FaceFormat::of(corners[0]).ok_or_else(|| ObjError::MalformedNumber {
            name: context.name.to_string(),
            line: context.line,
            token: corners[0].to_string(),
        })?;
        let format = *self.face_format.get_or_insert(found);

        for corner in corners {
            let corner_format = FaceFormat::of(corner);
            if corner_format != Some(format) {
                return Err(ObjError::InconsistentFaceFormat {
                    name: context.name.to_string(),
                    line: context.line,
                    expected: format,
                    found: corner_format.unwrap_or(found),
                });
            }
        }

        match format {
            FaceFormat::Position => {
                for corner in corners {
                    let position = context.index(corner)?;
                    self.position_indices.push(position);
                }
            }
            FaceFormat::PositionNormal | FaceFormat::PositionTextureNormal => {
                let mut positions = [None; 3];
                let mut normals = [None; 3];
                for (slot, corner) in corners.iter().enumerate() {
                    let mut fields = corner.split('/');
                    positions[slot] = context.optional_index(fields.next().unwrap_or_default())?;
                    if format == FaceFormat::PositionTextureNormal {
                        // texture coordinate index
                        context.optional_index(fields.next().unwrap_or_default())?;
                    }
                    normals[slot] = context.optional_index(fields.next().unwrap_or_default())?;
                }

                if let [Some(a), Some(b), Some(c)] = positions {
                    self.position_indices.extend([a, b, c]);
                }
                if let [Some(a), Some(b), Some(c)] = normals {
                    self.normal_indices.extend([a, b, c]);
                }
            }
        }

        Ok(())
    }

    /// Number of position vertices
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Number of face corners in the position stream
    pub fn face_vertex_count(&self) -> usize {
        self.position_indices.len()
    }

    /// Whether both normal components and a normal index stream are present
    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty() && !self.normal_indices.is_empty()
    }

    /// Bounding box of all positions, `None` when there are none
    pub fn bounds(&self) -> Option<Bounds> {
        let mut points = self.positions.chunks_exact(3).map(|p| Vec3::new(p[0], p[1], p[2]));
        let first = points.next()?;
        let (min, max) = points.fold((first, first), |(min, max), p| (min.inf(&p), max.sup(&p)));
        Some(Bounds { min, max })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const QUAD: &str = "\
# two triangles sharing an edge
o quad
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 1.0 1.0 0.0
v 0.0 1.0 0.0
vn 0.0 0.0 1.0
vt 0.5 0.5
s off
f 1//1 2//1 3//1
f 1//1 3//1 4//1
";

    #[test]
    fn test_parse_triple_faces_with_empty_texcoords() {
        let geometry = GeometryFile::parse("quad.obj", QUAD).unwrap();

        assert_eq!(geometry.vertex_count(), 4);
        assert_eq!(geometry.normals, vec![0.0, 0.0, 1.0]);
        assert_eq!(geometry.position_indices, vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(geometry.normal_indices, vec![0; 6]);
        assert_eq!(geometry.face_format, Some(FaceFormat::PositionTextureNormal));
        assert!(geometry.has_normals());
    }

    #[test]
    fn test_parse_bare_faces() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";
        let geometry = GeometryFile::parse("tri.obj", text).unwrap();

        assert_eq!(geometry.position_indices, vec![0, 1, 2]);
        assert!(geometry.normal_indices.is_empty());
        assert!(!geometry.has_normals());
    }

    #[test]
    fn test_parse_pair_faces_are_position_normal() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nvn 0 0 -1\nf 1/2 2/2 3/1\n";
        let geometry = GeometryFile::parse("pair.obj", text).unwrap();

        assert_eq!(geometry.position_indices, vec![0, 1, 2]);
        assert_eq!(geometry.normal_indices, vec![1, 1, 0]);
    }

    #[test]
    fn test_triple_with_missing_normal_keeps_positions_only() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nf 1/1/1 2/1/ 3/1/1\n";
        let geometry = GeometryFile::parse("partial.obj", text).unwrap();

        assert_eq!(geometry.position_indices, vec![0, 1, 2]);
        assert!(geometry.normal_indices.is_empty());
    }

    #[test]
    fn test_triple_with_malformed_subtoken_treated_as_absent() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf x/1/1 2/1/1 3/1/1\n";
        let geometry = GeometryFile::parse("bad.obj", text).unwrap();

        assert!(geometry.position_indices.is_empty());
        assert_eq!(geometry.normal_indices, vec![0, 0, 0]);
    }

    #[test]
    fn test_bare_malformed_index_fails() {
        let text = "v 0 0 0\nf 1 two 3\n";
        let err = GeometryFile::parse("bad.obj", text).unwrap_err();

        assert!(matches!(err, ObjError::MalformedNumber { line: 2, ref token, .. } if token == "two"));
    }

    #[test]
    fn test_malformed_vertex_component_fails() {
        let err = GeometryFile::parse("bad.obj", "v 0 zero 0\n").unwrap_err();
        assert!(matches!(err, ObjError::MalformedNumber { line: 1, .. }));
    }

    #[test]
    fn test_face_arity_must_be_three() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nv 1 1 0\nf 1 2 3 4\n";
        let err = GeometryFile::parse("quad.obj", text).unwrap_err();

        assert!(matches!(err, ObjError::Arity { keyword: "f", expected: 3, found: 4, .. }));
    }

    #[test]
    fn test_mixed_face_grammar_is_rejected() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nf 1//1 2//1 3//1\nf 1 2 3\n";
        let err = GeometryFile::parse("mixed.obj", text).unwrap_err();

        match err {
            ObjError::InconsistentFaceFormat { line, expected, found, .. } => {
                assert_eq!(line, 6);
                assert_eq!(expected, FaceFormat::PositionTextureNormal);
                assert_eq!(found, FaceFormat::Position);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_index_beyond_sixteen_bits_fails() {
        let err = GeometryFile::parse("big.obj", "f 1 2 65537\n").unwrap_err();
        assert!(matches!(err, ObjError::IndexOutOfRange { index: 65537, .. }));

        let geometry = GeometryFile::parse("edge.obj", "f 1 2 65536\n").unwrap();
        assert_eq!(geometry.position_indices, vec![0, 1, u16::MAX]);
    }

    #[test]
    fn test_bounds() {
        let geometry = GeometryFile::parse("quad.obj", QUAD).unwrap();
        let bounds = geometry.bounds().unwrap();

        assert_relative_eq!(bounds.min, Vec3::new(0.0, 0.0, 0.0));
        assert_relative_eq!(bounds.max, Vec3::new(1.0, 1.0, 0.0));
        assert_relative_eq!(bounds.center(), Vec3::new(0.5, 0.5, 0.0));
        assert!(GeometryFile::default().bounds().is_none());
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = GeometryFile::load("no/such/model.obj").unwrap_err();
        assert!(matches!(err, ObjError::Io(_)));
    }
}
