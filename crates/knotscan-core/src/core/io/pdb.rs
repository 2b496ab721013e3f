use super::loader::{AtomSelection, LoadError, ParseErrorKind};
use crate::core::models::chain::Frame;
use nalgebra::Point3;
use std::io::BufRead;

/// One `ATOM`/`HETATM` record.
#[derive(Debug, Clone, PartialEq)]
pub struct PdbAtom {
    pub name: String,
    pub chain_id: char,
    pub residue_seq: isize,
    pub position: Point3<f64>,
}

fn slice_and_trim(line: &str, start: usize, end: usize) -> &str {
    line.get(start..end).unwrap_or("").trim()
}

fn parse_float(line: &str, start: usize, end: usize, line_num: usize) -> Result<f64, LoadError> {
    let raw = slice_and_trim(line, start, end);
    raw.parse().map_err(|_| LoadError::Parse {
        line: line_num,
        kind: ParseErrorKind::InvalidFloat {
            field: match start {
                30 => "x",
                38 => "y",
                _ => "z",
            },
            value: raw.to_string(),
        },
    })
}

fn parse_atom(line: &str, line_num: usize) -> Result<PdbAtom, LoadError> {
    if line.len() < 54 {
        return Err(LoadError::Parse {
            line: line_num,
            kind: ParseErrorKind::LineTooShort,
        });
    }

    let name = slice_and_trim(line, 12, 16);
    if name.is_empty() {
        return Err(LoadError::Parse {
            line: line_num,
            kind: ParseErrorKind::MissingField("atom name"),
        });
    }
    let chain_id = line
        .get(21..22)
        .and_then(|s| s.chars().next())
        .unwrap_or(' ');
    let seq_str = slice_and_trim(line, 22, 26);
    let residue_seq = seq_str.parse().map_err(|_| LoadError::Parse {
        line: line_num,
        kind: ParseErrorKind::InvalidInt {
            field: "residue sequence number",
            value: seq_str.to_string(),
        },
    })?;

    Ok(PdbAtom {
        name: name.to_string(),
        chain_id,
        residue_seq,
        position: Point3::new(
            parse_float(line, 30, 38, line_num)?,
            parse_float(line, 38, 46, line_num)?,
            parse_float(line, 46, 54, line_num)?,
        ),
    })
}

/// Reads every model of a PDB file.
///
/// Files without `MODEL` records are treated as a single model.
pub fn read_models(reader: &mut impl BufRead) -> Result<Vec<Vec<PdbAtom>>, LoadError> {
    let mut models: Vec<Vec<PdbAtom>> = Vec::new();
    let mut current: Vec<PdbAtom> = Vec::new();
    let mut in_model = false;

    for (line_num, line_res) in reader.lines().enumerate() {
        let line = line_res?;
        let line_num = line_num + 1;

        match slice_and_trim(&line, 0, 6) {
            "ATOM" | "HETATM" => current.push(parse_atom(&line, line_num)?),
            "MODEL" => {
                if !current.is_empty() {
                    models.push(std::mem::take(&mut current));
                }
                in_model = true;
            }
            "ENDMDL" => {
                models.push(std::mem::take(&mut current));
                in_model = false;
            }
            "END" if !in_model => break,
            _ => {}
        }
    }
    if !current.is_empty() {
        models.push(current);
    }
    Ok(models)
}

/// Marks the atoms of one model that the selection keeps.
///
/// Without explicit chain ids only the first chain of the model is considered.
pub fn selection_mask(atoms: &[PdbAtom], selection: &AtomSelection) -> Vec<bool> {
    let first_chain = atoms.first().map(|a| a.chain_id);
    atoms
        .iter()
        .map(|atom| {
            let chain_ok = match &selection.chains {
                Some(chains) => chains.contains(&atom.chain_id),
                None => Some(atom.chain_id) == first_chain,
            };
            chain_ok && selection.atoms.iter().any(|name| *name == atom.name)
        })
        .collect()
}

fn apply_mask(atoms: &[PdbAtom], mask: &[bool]) -> Vec<Point3<f64>> {
    atoms
        .iter()
        .zip(mask)
        .filter(|(_, keep)| **keep)
        .map(|(atom, _)| atom.position)
        .collect()
}

/// Reads the selected atoms of every model as trajectory frames.
///
/// The selection is resolved on the first model and applied positionally to the rest,
/// so every model must list its atoms in the same order.
pub fn read_frames(
    reader: &mut impl BufRead,
    selection: &AtomSelection,
) -> Result<Vec<Frame>, LoadError> {
    let models = read_models(reader)?;
    let first = models.first().ok_or(LoadError::EmptySelection)?;
    let mask = selection_mask(first, selection);
    if !mask.iter().any(|keep| *keep) {
        return Err(LoadError::EmptySelection);
    }

    models
        .iter()
        .enumerate()
        .map(|(index, atoms)| {
            if atoms.len() != first.len() {
                return Err(LoadError::TopologyMismatch {
                    frame: index,
                    expected: first.len(),
                    found: atoms.len(),
                });
            }
            Ok(Frame::new(apply_mask(atoms, &mask)))
        })
        .collect()
}
