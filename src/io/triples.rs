//! Sparse `element component value` files.

use crate::error::{Result, SomkitError};
use crate::set::TrainingSet;
use crate::vector::Vector;
use log::{debug, info};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Parses triple text into a set. Elements and components are 1-based;
/// components `1..=input_dim` fill the input and the next `output_dim`
/// fill the output. Unlisted components are zero and elements come out in
/// ascending element number.
pub fn parse_triples(text: &str, name: &str, input_dim: usize, output_dim: usize) -> Result<TrainingSet> {
    let mut set = TrainingSet::new(name, input_dim, output_dim)?;
    let width = input_dim + output_dim;
    let mut rows: BTreeMap<usize, Vec<f64>> = BTreeMap::new();

    for (i, raw) in text.lines().enumerate() {
        let line_no = i + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != 3 {
            return Err(SomkitError::parse(line_no, format!("expected 3 fields, found {}", fields.len())));
        }
        let element: usize = fields[0]
            .parse()
            .map_err(|_| SomkitError::parse(line_no, format!("bad element '{}'", fields[0])))?;
        let component: usize = fields[1]
            .parse()
            .map_err(|_| SomkitError::parse(line_no, format!("bad component '{}'", fields[1])))?;
        let value: f64 = fields[2]
            .parse()
            .map_err(|_| SomkitError::parse(line_no, format!("bad value '{}'", fields[2])))?;
        if element == 0 {
            return Err(SomkitError::parse(line_no, "element numbers start at 1"));
        }
        if component == 0 || component > width {
            return Err(SomkitError::parse(
                line_no,
                format!("component {} outside 1..={}", component, width),
            ));
        }
        rows.entry(element).or_insert_with(|| vec![0.0; width])[component - 1] = value;
    }

    for (_, mut row) in rows {
        let output = row.split_off(input_dim);
        let output = (output_dim > 0).then(|| Vector::from(output));
        set.push(Vector::from(row), output)?;
    }
    debug!("Read {} elements into set '{}'", set.len(), set.name());
    Ok(set)
}

/// Loads one triple file.
pub fn load_triples(path: impl AsRef<Path>, name: &str, input_dim: usize, output_dim: usize) -> Result<TrainingSet> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(SomkitError::FileNotFound(path.to_path_buf()));
    }
    parse_triples(&fs::read_to_string(path)?, name, input_dim, output_dim)
}

/// Loads several triple files into one set, in the given order. The second
/// value holds, per element, the index of the file it came from.
pub fn load_triple_table<P: AsRef<Path>>(
    paths: &[P],
    name: &str,
    input_dim: usize,
    output_dim: usize,
) -> Result<(TrainingSet, Vec<usize>)> {
    let mut merged = TrainingSet::new(name, input_dim, output_dim)?;
    let mut origins = Vec::new();
    for (i, path) in paths.iter().enumerate() {
        let mut part = load_triples(path, name, input_dim, output_dim)?;
        origins.extend(std::iter::repeat(i).take(part.len()));
        TrainingSet::merge(&mut part, &mut merged)?;
    }
    info!("Loaded {} elements from {} files", merged.len(), paths.len());
    Ok((merged, origins))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_triples() {
        let text = "# speaker frames\n2 1 0.5\n1 1 1.0\n1 2 2.0\n1 3 1\n";
        let set = parse_triples(text, "frames", 2, 1).unwrap();
        assert_eq!(set.len(), 2);
        let first = set.element(1).unwrap();
        assert_eq!(first.input().as_slice(), &[1.0, 2.0]);
        assert_eq!(first.output().unwrap().as_slice(), &[1.0]);
        let second = set.element(2).unwrap();
        assert_eq!(second.input().as_slice(), &[0.5, 0.0]);
    }

    #[test]
    fn test_input_only() {
        let set = parse_triples("1 1 3\n", "x", 1, 0).unwrap();
        assert!(set.element(1).unwrap().output().is_none());
    }

    #[test]
    fn test_bad_lines() {
        assert!(matches!(
            parse_triples("1 1\n", "x", 1, 0),
            Err(SomkitError::Parse { line: 1, .. })
        ));
        assert!(matches!(
            parse_triples("\n1 3 0.0\n", "x", 2, 0),
            Err(SomkitError::Parse { line: 2, .. })
        ));
        assert!(parse_triples("0 1 1.0\n", "x", 1, 0).is_err());
        assert!(parse_triples("1 1 abc\n", "x", 1, 0).is_err());
    }

    #[test]
    fn test_load_table_tracks_origin() {
        let mut a = NamedTempFile::new().unwrap();
        writeln!(a, "1 1 1.0\n2 1 2.0").unwrap();
        let mut b = NamedTempFile::new().unwrap();
        writeln!(b, "1 1 3.0").unwrap();

        let (set, origins) = load_triple_table(&[a.path(), b.path()], "all", 1, 0).unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(origins, vec![0, 0, 1]);
        assert_eq!(set.element(3).unwrap().input().as_slice(), &[3.0]);
        assert_eq!(set.element(3).unwrap().index(), 3);
    }

    #[test]
    fn test_missing_file() {
        let err = load_triples("/nonexistent/frames.txt", "x", 1, 0).unwrap_err();
        assert!(matches!(err, SomkitError::FileNotFound(_)));
    }
}
