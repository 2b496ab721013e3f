use super::loader::{LoadError, ParseErrorKind};
use nalgebra::Point3;
use std::io::BufRead;

/// Reads a multi-frame XYZ file.
///
/// Each frame is an atom-count line, a free comment line, and one `element x y z` line
/// per atom. Blank lines between frames are ignored.
pub fn read_frames(reader: &mut impl BufRead) -> Result<Vec<Vec<Point3<f64>>>, LoadError> {
    let mut frames = Vec::new();
    let mut lines = reader.lines().enumerate().map(|(i, l)| (i + 1, l));

    while let Some((count_line, line_res)) = lines.next() {
        let line = line_res?;
        let count_str = line.trim();
        if count_str.is_empty() {
            continue;
        }
        let count: usize = count_str.parse().map_err(|_| LoadError::Parse {
            line: count_line,
            kind: ParseErrorKind::InvalidInt {
                field: "atom count",
                value: count_str.to_string(),
            },
        })?;

        match lines.next() {
            Some((_, comment)) => {
                comment?;
            }
            None => return Err(truncated(count_line, count, 0)),
        }

        let mut points = Vec::with_capacity(count);
        for found in 0..count {
            let Some((line_num, line_res)) = lines.next() else {
                return Err(truncated(count_line, count, found));
            };
            let line = line_res?;
            let mut fields = line.split_whitespace().skip(1);
            let mut coordinate = |name: &'static str| -> Result<f64, LoadError> {
                let raw = fields.next().ok_or(LoadError::Parse {
                    line: line_num,
                    kind: ParseErrorKind::MissingField(name),
                })?;
                raw.parse().map_err(|_| LoadError::Parse {
                    line: line_num,
                    kind: ParseErrorKind::InvalidFloat {
                        field: name,
                        value: raw.to_string(),
                    },
                })
            };
            let x = coordinate("x")?;
            let y = coordinate("y")?;
            let z = coordinate("z")?;
            points.push(Point3::new(x, y, z));
        }
        frames.push(points);
    }
    Ok(frames)
}

fn truncated(line: usize, expected: usize, found: usize) -> LoadError {
    LoadError::Parse {
        line,
        kind: ParseErrorKind::TruncatedFrame { expected, found },
    }
}

/// True when the first non-blank line is a bare atom count, i.e. the input is XYZ-framed
/// rather than a plain coordinate list.
pub fn looks_framed(text: &str) -> bool {
    text.lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .is_some_and(|l| l.parse::<usize>().is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const TWO_FRAMES: &str = "3\nframe 0\nC 0 0 0\nC 1 0 0\nC 2 0 0\n\n3\nframe 1\nC 0 1 0\nC 1 1 0\nC 2 1 0.5\n";

    #[test]
    fn reads_consecutive_frames() {
        let frames = read_frames(&mut Cursor::new(TWO_FRAMES)).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1][2], Point3::new(2.0, 1.0, 0.5));
    }

    #[test]
    fn truncated_frame_names_the_count_line() {
        let err = read_frames(&mut Cursor::new("4\ncomment\nC 0 0 0\nC 1 0 0\n")).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Parse {
                line: 1,
                kind: ParseErrorKind::TruncatedFrame {
                    expected: 4,
                    found: 2
                }
            }
        ));
    }

    #[test]
    fn detects_framed_input() {
        assert!(looks_framed(TWO_FRAMES));
        assert!(!looks_framed("0.0 1.0 2.0\n"));
    }
}
