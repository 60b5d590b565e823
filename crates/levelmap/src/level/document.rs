use std::fmt;

use roxmltree::{Document, Node};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// An auxiliary spawn marker position as authored in the editor, in pixel
/// space (y grows downward).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelPoint {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileDataEncoding {
    Base64,
    Csv,
}

/// Everything the rest of the pipeline needs from one map document. Built
/// once per load and discarded after assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct MapDocument {
    pub columns: u32,
    pub rows: u32,
    pub tile_width_px: u32,
    pub tile_height_px: u32,
    pub atlas_tile_count: u32,
    pub atlas_columns: u32,
    /// The image path exactly as written in the document. Joining it against
    /// the map file's directory is the caller's job.
    pub atlas_image_source: String,
    pub encoding: TileDataEncoding,
    pub raw_tile_data: String,
    pub object_markers_px: Vec<PixelPoint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    #[error("malformed XML: {message} ({location})")]
    Malformed {
        message: String,
        location: SourceLocation,
    },
    #[error("missing required <{element}> element")]
    MissingElement { element: &'static str },
    #[error("missing required '{attribute}' attribute on <{element}> ({location})")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
        location: SourceLocation,
    },
    #[error("invalid '{attribute}' value '{value}' on <{element}>: {expected} ({location})")]
    InvalidAttribute {
        element: &'static str,
        attribute: &'static str,
        value: String,
        expected: &'static str,
        location: SourceLocation,
    },
    #[error("unrecognized tile data encoding '{value}'; expected 'base64' or 'csv' ({location})")]
    UnrecognizedEncoding {
        value: String,
        location: SourceLocation,
    },
    #[error("found {count} <{element}> elements; only a single {element} is supported")]
    UnsupportedMultiple { element: &'static str, count: usize },
}

pub fn parse_map_document(source: &str) -> Result<MapDocument, DocumentError> {
    let doc = Document::parse(source).map_err(|error| DocumentError::Malformed {
        message: error.to_string(),
        location: SourceLocation {
            line: error.pos().row as usize,
            column: error.pos().col as usize,
        },
    })?;

    let map = doc.root_element();
    if map.tag_name().name() != "map" {
        return Err(DocumentError::MissingElement { element: "map" });
    }

    let columns = required_count(&doc, map, "map", "width")?;
    let rows = required_count(&doc, map, "map", "height")?;

    let tileset = single_element_child(map, "tileset")?;
    let tile_width_px = required_count(&doc, tileset, "tileset", "tilewidth")?;
    let tile_height_px = required_count(&doc, tileset, "tileset", "tileheight")?;
    let atlas_tile_count = required_count(&doc, tileset, "tileset", "tilecount")?;
    let atlas_columns = required_count(&doc, tileset, "tileset", "columns")?;

    let image = first_element_child(tileset, "image")
        .ok_or(DocumentError::MissingElement { element: "image" })?;
    let atlas_image_source = required_attribute(&doc, image, "image", "source")?.to_string();

    let layer = single_element_child(map, "layer")?;
    let data = first_element_child(layer, "data")
        .ok_or(DocumentError::MissingElement { element: "data" })?;
    let encoding = parse_encoding(&doc, data)?;
    let raw_tile_data = data.text().map(str::trim).unwrap_or_default().to_string();

    let mut object_markers_px = Vec::new();
    if let Some(group) = first_element_child(map, "objectgroup") {
        for object in group
            .children()
            .filter(|node| node.is_element() && node.tag_name().name() == "object")
        {
            object_markers_px.push(PixelPoint {
                x: required_float(&doc, object, "object", "x")?,
                y: required_float(&doc, object, "object", "y")?,
            });
        }
    }

    Ok(MapDocument {
        columns,
        rows,
        tile_width_px,
        tile_height_px,
        atlas_tile_count,
        atlas_columns,
        atlas_image_source,
        encoding,
        raw_tile_data,
        object_markers_px,
    })
}

fn parse_encoding(doc: &Document<'_>, data: Node<'_, '_>) -> Result<TileDataEncoding, DocumentError> {
    let raw = required_attribute(doc, data, "data", "encoding")?;
    match raw {
        "base64" => Ok(TileDataEncoding::Base64),
        "csv" => Ok(TileDataEncoding::Csv),
        other => Err(DocumentError::UnrecognizedEncoding {
            value: other.to_string(),
            location: location_of(doc, data),
        }),
    }
}

/// Exactly one child element with the given name. Multiple matches are an
/// explicit unsupported-feature failure, never a silent first-of-many.
fn single_element_child<'a>(
    parent: Node<'a, 'a>,
    name: &'static str,
) -> Result<Node<'a, 'a>, DocumentError> {
    let mut matches = parent
        .children()
        .filter(|node| node.is_element() && node.tag_name().name() == name);
    let first = matches
        .next()
        .ok_or(DocumentError::MissingElement { element: name })?;
    let extra = matches.count();
    if extra > 0 {
        return Err(DocumentError::UnsupportedMultiple {
            element: name,
            count: extra + 1,
        });
    }
    Ok(first)
}

fn first_element_child<'a>(parent: Node<'a, 'a>, name: &str) -> Option<Node<'a, 'a>> {
    parent
        .children()
        .find(|node| node.is_element() && node.tag_name().name() == name)
}

fn required_attribute<'a>(
    doc: &Document<'_>,
    node: Node<'a, 'a>,
    element: &'static str,
    attribute: &'static str,
) -> Result<&'a str, DocumentError> {
    node.attribute(attribute)
        .ok_or_else(|| DocumentError::MissingAttribute {
            element,
            attribute,
            location: location_of(doc, node),
        })
}

fn required_count(
    doc: &Document<'_>,
    node: Node<'_, '_>,
    element: &'static str,
    attribute: &'static str,
) -> Result<u32, DocumentError> {
    let raw = required_attribute(doc, node, element, attribute)?;
    let parsed = raw.parse::<u32>().ok().filter(|value| *value > 0);
    parsed.ok_or_else(|| DocumentError::InvalidAttribute {
        element,
        attribute,
        value: raw.to_string(),
        expected: "a positive integer",
        location: location_of(doc, node),
    })
}

fn required_float(
    doc: &Document<'_>,
    node: Node<'_, '_>,
    element: &'static str,
    attribute: &'static str,
) -> Result<f32, DocumentError> {
    let raw = required_attribute(doc, node, element, attribute)?;
    let parsed = raw.parse::<f32>().ok().filter(|value| value.is_finite());
    parsed.ok_or_else(|| DocumentError::InvalidAttribute {
        element,
        attribute,
        value: raw.to_string(),
        expected: "a finite number",
        location: location_of(doc, node),
    })
}

fn location_of(doc: &Document<'_>, node: Node<'_, '_>) -> SourceLocation {
    let pos = doc.text_pos_at(node.range().start);
    SourceLocation {
        line: pos.row as usize,
        column: pos.col as usize,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_MAP: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<map version="1.2" orientation="orthogonal" width="2" height="2" tilewidth="32" tileheight="32">
 <tileset firstgid="1" name="ground" tilewidth="32" tileheight="32" tilecount="8" columns="4">
  <image source="tiles.png" width="128" height="64"/>
 </tileset>
 <layer name="ground" width="2" height="2">
  <data encoding="csv">
1,2,
3,4
  </data>
 </layer>
 <objectgroup name="turrets">
  <object id="1" x="32" y="48.5"/>
  <object id="2" x="96" y="16"/>
 </objectgroup>
</map>"#;

    #[test]
    fn valid_document_parses_completely() {
        let document = parse_map_document(VALID_MAP).expect("parse");
        assert_eq!(document.columns, 2);
        assert_eq!(document.rows, 2);
        assert_eq!(document.tile_width_px, 32);
        assert_eq!(document.tile_height_px, 32);
        assert_eq!(document.atlas_tile_count, 8);
        assert_eq!(document.atlas_columns, 4);
        assert_eq!(document.atlas_image_source, "tiles.png");
        assert_eq!(document.encoding, TileDataEncoding::Csv);
        assert_eq!(document.raw_tile_data, "1,2,\n3,4");
        assert_eq!(
            document.object_markers_px,
            vec![
                PixelPoint { x: 32.0, y: 48.5 },
                PixelPoint { x: 96.0, y: 16.0 }
            ]
        );
    }

    #[test]
    fn object_group_is_optional() {
        let source = VALID_MAP.replace(
            "<objectgroup name=\"turrets\">\n  <object id=\"1\" x=\"32\" y=\"48.5\"/>\n  <object id=\"2\" x=\"96\" y=\"16\"/>\n </objectgroup>\n",
            "",
        );
        let document = parse_map_document(&source).expect("parse");
        assert!(document.object_markers_px.is_empty());
    }

    #[test]
    fn malformed_xml_reports_a_location() {
        let error = parse_map_document("<map width=\"2\"").expect_err("error");
        assert!(matches!(error, DocumentError::Malformed { .. }));
    }

    #[test]
    fn non_map_root_is_rejected() {
        let error = parse_map_document("<tileset/>").expect_err("error");
        assert_eq!(error, DocumentError::MissingElement { element: "map" });
    }

    #[test]
    fn missing_map_dimension_attribute_is_rejected() {
        let source = VALID_MAP.replace(" width=\"2\"", "");
        let error = parse_map_document(&source).expect_err("error");
        assert!(matches!(
            error,
            DocumentError::MissingAttribute {
                element: "map",
                attribute: "width",
                ..
            }
        ));
    }

    #[test]
    fn zero_map_dimension_is_rejected() {
        let source = VALID_MAP.replace("height=\"2\" tilewidth", "height=\"0\" tilewidth");
        let error = parse_map_document(&source).expect_err("error");
        assert!(matches!(
            error,
            DocumentError::InvalidAttribute {
                element: "map",
                attribute: "height",
                ..
            }
        ));
    }

    #[test]
    fn missing_tileset_is_rejected() {
        let source = "<map width=\"2\" height=\"2\"><layer><data encoding=\"csv\">1</data></layer></map>";
        let error = parse_map_document(source).expect_err("error");
        assert_eq!(error, DocumentError::MissingElement { element: "tileset" });
    }

    #[test]
    fn second_tileset_is_an_unsupported_feature() {
        let source = VALID_MAP.replace(
            "</tileset>",
            "</tileset>\n <tileset firstgid=\"9\" name=\"extra\" tilewidth=\"32\" tileheight=\"32\" tilecount=\"4\" columns=\"2\"><image source=\"extra.png\"/></tileset>",
        );
        let error = parse_map_document(&source).expect_err("error");
        assert_eq!(
            error,
            DocumentError::UnsupportedMultiple {
                element: "tileset",
                count: 2
            }
        );
    }

    #[test]
    fn second_layer_is_an_unsupported_feature() {
        let source = VALID_MAP.replace(
            "</layer>",
            "</layer>\n <layer name=\"decor\" width=\"2\" height=\"2\"><data encoding=\"csv\">1,1,1,1</data></layer>",
        );
        let error = parse_map_document(&source).expect_err("error");
        assert_eq!(
            error,
            DocumentError::UnsupportedMultiple {
                element: "layer",
                count: 2
            }
        );
    }

    #[test]
    fn missing_image_element_is_rejected() {
        let source = VALID_MAP.replace("<image source=\"tiles.png\" width=\"128\" height=\"64\"/>", "");
        let error = parse_map_document(&source).expect_err("error");
        assert_eq!(error, DocumentError::MissingElement { element: "image" });
    }

    #[test]
    fn unrecognized_encoding_is_rejected() {
        let source = VALID_MAP.replace("encoding=\"csv\"", "encoding=\"zlib\"");
        let error = parse_map_document(&source).expect_err("error");
        assert!(matches!(
            error,
            DocumentError::UnrecognizedEncoding { value, .. } if value == "zlib"
        ));
    }

    #[test]
    fn missing_encoding_attribute_is_rejected() {
        let source = VALID_MAP.replace(" encoding=\"csv\"", "");
        let error = parse_map_document(&source).expect_err("error");
        assert!(matches!(
            error,
            DocumentError::MissingAttribute {
                element: "data",
                attribute: "encoding",
                ..
            }
        ));
    }

    #[test]
    fn non_numeric_object_coordinate_is_rejected() {
        let source = VALID_MAP.replace("x=\"96\"", "x=\"east\"");
        let error = parse_map_document(&source).expect_err("error");
        assert!(matches!(
            error,
            DocumentError::InvalidAttribute {
                element: "object",
                attribute: "x",
                ..
            }
        ));
    }

    #[test]
    fn markers_preserve_document_order() {
        let document = parse_map_document(VALID_MAP).expect("parse");
        assert!(document.object_markers_px[0].x < document.object_markers_px[1].x);
    }
}
