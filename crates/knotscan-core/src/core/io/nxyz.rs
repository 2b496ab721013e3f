use super::loader::{LoadError, ParseErrorKind, Structure};
use crate::core::models::chain::ChainSegment;
use nalgebra::Point3;
use std::io::{self, BufRead, Write};

/// Writes one `index x y z` line per point, numbering from the segment's first chain index.
pub fn write_segment(segment: &ChainSegment<'_>, writer: &mut impl Write) -> io::Result<()> {
    for (offset, point) in segment.points.iter().enumerate() {
        writeln!(
            writer,
            "{} {} {} {}",
            segment.first_index + offset,
            point.x,
            point.y,
            point.z
        )?;
    }
    Ok(())
}

fn parse_coordinate(field: Option<&str>, name: &'static str, line: usize) -> Result<f64, LoadError> {
    let raw = field.ok_or(LoadError::Parse {
        line,
        kind: ParseErrorKind::MissingField(name),
    })?;
    raw.parse().map_err(|_| LoadError::Parse {
        line,
        kind: ParseErrorKind::InvalidFloat {
            field: name,
            value: raw.to_string(),
        },
    })
}

/// Reads an indexed structure (`index x y z` per line).
///
/// Indices must be consecutive; the first one becomes the structure's first chain index.
pub fn read_indexed(reader: &mut impl BufRead) -> Result<Structure, LoadError> {
    let mut points = Vec::new();
    let mut first_index = None;

    for (line_num, line_res) in reader.lines().enumerate() {
        let line = line_res?;
        let line_num = line_num + 1;
        let mut fields = line.split_whitespace();
        let Some(raw_index) = fields.next() else {
            continue;
        };

        let index: usize = raw_index.parse().map_err(|_| LoadError::Parse {
            line: line_num,
            kind: ParseErrorKind::InvalidInt {
                field: "index",
                value: raw_index.to_string(),
            },
        })?;
        let expected = first_index.unwrap_or(index) + points.len();
        if index != expected {
            return Err(LoadError::Parse {
                line: line_num,
                kind: ParseErrorKind::NonContiguousIndex {
                    expected,
                    found: index,
                },
            });
        }
        first_index.get_or_insert(index);

        let x = parse_coordinate(fields.next(), "x", line_num)?;
        let y = parse_coordinate(fields.next(), "y", line_num)?;
        let z = parse_coordinate(fields.next(), "z", line_num)?;
        points.push(Point3::new(x, y, z));
    }

    if points.is_empty() {
        return Err(LoadError::EmptySelection);
    }
    Ok(Structure {
        points,
        first_index: first_index.unwrap_or(0),
    })
}

/// Reads a bare coordinate list (`x y z` per line), numbered from zero.
pub fn read_plain(reader: &mut impl BufRead) -> Result<Structure, LoadError> {
    let mut points = Vec::new();
    for (line_num, line_res) in reader.lines().enumerate() {
        let line = line_res?;
        let line_num = line_num + 1;
        if line.trim().is_empty() {
            continue;
        }
        let mut fields = line.split_whitespace();
        let x = parse_coordinate(fields.next(), "x", line_num)?;
        let y = parse_coordinate(fields.next(), "y", line_num)?;
        let z = parse_coordinate(fields.next(), "z", line_num)?;
        points.push(Point3::new(x, y, z));
    }

    if points.is_empty() {
        return Err(LoadError::EmptySelection);
    }
    Ok(Structure {
        points,
        first_index: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn written_segment_reads_back_with_its_indices() {
        let points = vec![
            Point3::new(1.0, 2.0, 3.0),
            Point3::new(-1.5, 0.25, 8.0),
            Point3::new(0.0, 0.0, -2.0),
        ];
        let mut buffer = Vec::new();
        write_segment(&ChainSegment::new(&points, 17), &mut buffer).unwrap();

        let text = String::from_utf8(buffer.clone()).unwrap();
        assert!(text.starts_with("17 1 2 3\n"));

        let structure = read_indexed(&mut Cursor::new(buffer)).unwrap();
        assert_eq!(structure.first_index, 17);
        assert_eq!(structure.points, points);
    }

    #[test]
    fn gaps_in_the_index_column_are_rejected() {
        let input = "3 0 0 0\n4 1 0 0\n6 2 0 0\n";
        let err = read_indexed(&mut Cursor::new(input)).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Parse {
                line: 3,
                kind: ParseErrorKind::NonContiguousIndex {
                    expected: 5,
                    found: 6
                }
            }
        ));
    }

    #[test]
    fn plain_lists_skip_blank_lines_and_number_from_zero() {
        let input = "0 0 0\n\n1.5 2 3\n";
        let structure = read_plain(&mut Cursor::new(input)).unwrap();
        assert_eq!(structure.first_index, 0);
        assert_eq!(structure.points.len(), 2);
        assert_eq!(structure.points[1], Point3::new(1.5, 2.0, 3.0));
    }

    #[test]
    fn missing_coordinate_is_reported_with_its_line() {
        let err = read_plain(&mut Cursor::new("0 0 0\n1 2\n")).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Parse {
                line: 2,
                kind: ParseErrorKind::MissingField("z")
            }
        ));
    }
}
