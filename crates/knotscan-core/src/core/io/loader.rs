use super::{nxyz, pdb, xyz};
use crate::core::models::chain::{ChainSegment, Frame, Trajectory, TrajectoryError};
use nalgebra::Point3;
use std::fs::{self, File};
use std::io::{self, BufReader, Cursor};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: ParseErrorKind },
    #[error("A topology file is required to read '{}'", .path.display())]
    MissingTopology { path: PathBuf },
    #[error("Unsupported file format: '{0}'")]
    UnsupportedFormat(String),
    #[error("No atoms matched the selection")]
    EmptySelection,
    #[error("Frame {frame} has {found} atoms, but the topology lists {expected}")]
    TopologyMismatch {
        frame: usize,
        expected: usize,
        found: usize,
    },
    #[error(transparent)]
    Trajectory(#[from] TrajectoryError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseErrorKind {
    #[error("Invalid integer for {field} (value: '{value}')")]
    InvalidInt { field: &'static str, value: String },
    #[error("Invalid number for {field} (value: '{value}')")]
    InvalidFloat { field: &'static str, value: String },
    #[error("Required field '{0}' is missing")]
    MissingField(&'static str),
    #[error("Line is too short for an ATOM/HETATM record")]
    LineTooShort,
    #[error("Frame declares {expected} atoms but only {found} follow")]
    TruncatedFrame { expected: usize, found: usize },
    #[error("Expected index {expected}, found {found}")]
    NonContiguousIndex { expected: usize, found: usize },
}

/// Which atoms of a PDB model make up the analysed chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtomSelection {
    /// Chain ids to keep; `None` keeps the first chain only.
    pub chains: Option<Vec<char>>,
    pub atoms: Vec<String>,
}

impl Default for AtomSelection {
    fn default() -> Self {
        Self {
            chains: None,
            atoms: vec!["CA".to_string()],
        }
    }
}

/// A single chain conformation, numbered from `first_index`.
#[derive(Debug, Clone, PartialEq)]
pub struct Structure {
    pub points: Vec<Point3<f64>>,
    pub first_index: usize,
}

impl Structure {
    pub fn segment(&self) -> ChainSegment<'_> {
        ChainSegment::new(&self.points, self.first_index)
    }
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default()
}

fn open(path: &Path) -> Result<BufReader<File>, LoadError> {
    Ok(BufReader::new(File::open(path)?))
}

/// Loads a trajectory, one frame per model or XYZ frame.
///
/// PDB files carry their own topology. XYZ (and XTC) trajectories need a PDB topology
/// whose atom records line up with the trajectory rows; the selection is resolved on it.
///
/// # Errors
///
/// Returns [`LoadError::MissingTopology`] for XYZ/XTC input without a topology, and
/// [`LoadError::UnsupportedFormat`] for XTC input and unknown extensions.
pub fn load_trajectory(
    path: &Path,
    topology: Option<&Path>,
    selection: &AtomSelection,
) -> Result<Trajectory, LoadError> {
    let ext = extension(path);
    let frames = match ext.as_str() {
        "pdb" => pdb::read_frames(&mut open(path)?, selection)?,
        "xyz" | "xtc" => {
            let topology = topology.ok_or_else(|| LoadError::MissingTopology {
                path: path.to_path_buf(),
            })?;
            if ext == "xtc" {
                return Err(LoadError::UnsupportedFormat(ext));
            }
            read_xyz_with_topology(path, topology, selection)?
        }
        _ => return Err(LoadError::UnsupportedFormat(ext)),
    };

    let trajectory = Trajectory::new(frames)?;
    info!(
        path = %path.display(),
        frames = trajectory.len(),
        chain_length = trajectory.chain_len(),
        "Trajectory loaded."
    );
    Ok(trajectory)
}

fn read_xyz_with_topology(
    path: &Path,
    topology: &Path,
    selection: &AtomSelection,
) -> Result<Vec<Frame>, LoadError> {
    let models = pdb::read_models(&mut open(topology)?)?;
    let atoms = models.first().ok_or(LoadError::EmptySelection)?;
    let mask = pdb::selection_mask(atoms, selection);
    if !mask.iter().any(|keep| *keep) {
        return Err(LoadError::EmptySelection);
    }
    debug!(
        topology = %topology.display(),
        atoms = atoms.len(),
        selected = mask.iter().filter(|k| **k).count(),
        "Topology resolved."
    );

    xyz::read_frames(&mut open(path)?)?
        .into_iter()
        .enumerate()
        .map(|(frame, points)| {
            if points.len() != mask.len() {
                return Err(LoadError::TopologyMismatch {
                    frame,
                    expected: mask.len(),
                    found: points.len(),
                });
            }
            Ok(Frame::new(
                points
                    .into_iter()
                    .zip(&mask)
                    .filter_map(|(p, keep)| keep.then_some(p))
                    .collect(),
            ))
        })
        .collect()
}

/// Loads a single chain conformation.
///
/// `.pdb` takes the selected atoms of the first model, numbered from zero. `.nxyz` keeps
/// the file's indices. `.xyz` accepts either an XYZ-framed file (first frame) or a plain
/// coordinate list.
pub fn load_structure(path: &Path, selection: &AtomSelection) -> Result<Structure, LoadError> {
    let ext = extension(path);
    let structure = match ext.as_str() {
        "pdb" => {
            let frames = pdb::read_frames(&mut open(path)?, selection)?;
            let first = frames.into_iter().next().ok_or(LoadError::EmptySelection)?;
            Structure {
                points: first.points().to_vec(),
                first_index: 0,
            }
        }
        "nxyz" => nxyz::read_indexed(&mut open(path)?)?,
        "xyz" => {
            let text = fs::read_to_string(path)?;
            if xyz::looks_framed(&text) {
                let points = xyz::read_frames(&mut Cursor::new(text))?
                    .into_iter()
                    .next()
                    .filter(|p| !p.is_empty())
                    .ok_or(LoadError::EmptySelection)?;
                Structure {
                    points,
                    first_index: 0,
                }
            } else {
                nxyz::read_plain(&mut Cursor::new(text))?
            }
        }
        _ => return Err(LoadError::UnsupportedFormat(ext)),
    };
    if structure.points.len() < 2 {
        return Err(TrajectoryError::ChainTooShort(structure.points.len()).into());
    }
    debug!(
        path = %path.display(),
        points = structure.points.len(),
        first_index = structure.first_index,
        "Structure loaded."
    );
    Ok(structure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    fn topology() -> String {
        [
            "ATOM      1  N   ALA A   1       0.000   0.000   0.000  1.00  0.00           N",
            "ATOM      2  CA  ALA A   1       1.000   0.000   0.000  1.00  0.00           C",
            "ATOM      3  N   ALA A   2       2.000   0.000   0.000  1.00  0.00           N",
            "ATOM      4  CA  ALA A   2       3.000   0.000   0.000  1.00  0.00           C",
            "END",
        ]
        .join("\n")
    }

    #[test]
    fn xyz_trajectory_without_topology_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "traj.xyz", "4\n\nC 0 0 0\nC 1 0 0\nC 2 0 0\nC 3 0 0\n");
        let result = load_trajectory(&path, None, &AtomSelection::default());
        assert!(matches!(result, Err(LoadError::MissingTopology { .. })));
    }

    #[test]
    fn xtc_needs_topology_before_being_rejected_as_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "traj.xtc", "");
        let top = write(&dir, "top.pdb", &topology());
        assert!(matches!(
            load_trajectory(&path, None, &AtomSelection::default()),
            Err(LoadError::MissingTopology { .. })
        ));
        assert!(matches!(
            load_trajectory(&path, Some(&top), &AtomSelection::default()),
            Err(LoadError::UnsupportedFormat(ext)) if ext == "xtc"
        ));
    }

    #[test]
    fn xyz_rows_are_filtered_through_the_topology() {
        let dir = tempfile::tempdir().unwrap();
        let top = write(&dir, "top.pdb", &topology());
        let path = write(
            &dir,
            "traj.xyz",
            "4\nt=0\nN 0 0 0\nC 1 0 0\nN 2 0 0\nC 3 0 0\n4\nt=1\nN 0 1 0\nC 1 1 0\nN 2 1 0\nC 3 1 0\n",
        );
        let trajectory = load_trajectory(&path, Some(&top), &AtomSelection::default()).unwrap();
        assert_eq!(trajectory.len(), 2);
        assert_eq!(trajectory.chain_len(), 2);
        assert_eq!(trajectory.frames()[1].points()[1], Point3::new(3.0, 1.0, 0.0));
    }

    #[test]
    fn xyz_frame_disagreeing_with_topology_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let top = write(&dir, "top.pdb", &topology());
        let path = write(&dir, "traj.xyz", "3\n\nN 0 0 0\nC 1 0 0\nN 2 0 0\n");
        let result = load_trajectory(&path, Some(&top), &AtomSelection::default());
        assert!(matches!(
            result,
            Err(LoadError::TopologyMismatch {
                frame: 0,
                expected: 4,
                found: 3
            })
        ));
    }

    #[test]
    fn structure_formats_are_picked_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let nxyz = write(&dir, "s.nxyz", "5 0 0 0\n6 1 0 0\n7 2 0 0\n");
        let plain = write(&dir, "s.xyz", "0 0 0\n1 0 0\n");
        let pdb = write(&dir, "s.pdb", &topology());

        let selection = AtomSelection::default();
        assert_eq!(load_structure(&nxyz, &selection).unwrap().first_index, 5);
        assert_eq!(load_structure(&plain, &selection).unwrap().points.len(), 2);
        assert_eq!(load_structure(&pdb, &selection).unwrap().points.len(), 2);
        assert!(matches!(
            load_structure(&dir.path().join("s.gro"), &selection),
            Err(LoadError::UnsupportedFormat(_))
        ));
    }
}
