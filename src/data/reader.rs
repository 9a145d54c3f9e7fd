use super::Observation;
use crate::errors::Error;
use log::debug;
use std::path::Path;

const N_COLUMNS: usize = 6;

/// Read a data file with one observation per row
///
/// Columns are `id x y sigma_y sigma_x rho_xy`, separated by whitespace.
/// Blank lines and lines starting with `#` are skipped.
pub fn read_data(path: &Path) -> Result<Vec<Observation>, Error> {
    let contents: String = std::fs::read_to_string(path).map_err(|source: std::io::Error| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let observations: Vec<Observation> = parse_data(&contents)?;
    debug!("read_data: {} observations from {:?}", observations.len(), path);

    return Ok(observations);
}

/// Parse the contents of a data file, see [`read_data`]
pub fn parse_data(contents: &str) -> Result<Vec<Observation>, Error> {
    let mut observations: Vec<Observation> = Vec::new();

    for (i_line, line) in contents.lines().enumerate() {
        let line_number: usize = i_line + 1;
        let trimmed: &str = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let columns: Vec<&str> = trimmed.split_whitespace().collect();
        if columns.len() != N_COLUMNS {
            return Err(Error::Parse {
                line: line_number,
                message: format!("expected {} columns, found {}", N_COLUMNS, columns.len()),
            });
        }

        let id: i64 = columns[0].parse().map_err(|_| Error::Parse {
            line: line_number,
            message: format!("id `{}` is not an integer", columns[0]),
        })?;

        let mut values: [f64; N_COLUMNS - 1] = [f64::NAN; N_COLUMNS - 1];
        for i_column in 1..N_COLUMNS {
            values[i_column - 1] = columns[i_column].parse().map_err(|_| Error::Parse {
                line: line_number,
                message: format!("column {} value `{}` is not a number", i_column + 1, columns[i_column]),
            })?;
        }

        // sigma_y is checked by the fit, which names the offending id
        let (sigma_x, rho_xy): (f64, f64) = (values[3], values[4]);
        if !(sigma_x >= 0.0 && sigma_x.is_finite()) {
            return Err(Error::Parse {
                line: line_number,
                message: format!("sigma_x={} must be finite and non-negative", sigma_x),
            });
        }
        if !(-1.0..=1.0).contains(&rho_xy) {
            return Err(Error::Parse {
                line: line_number,
                message: format!("rho_xy={} must lie in [-1, 1]", rho_xy),
            });
        }

        observations.push(Observation {
            id,
            x: values[0],
            y: values[1],
            sigma_y: values[2],
            sigma_x,
            rho_xy,
        });
    }

    return Ok(observations);
}

#[test]
fn test_parse_data_skips_comments() {
    let contents: &str = "# id x y sigma_y sigma_x rho\n\n1 201 592 61 9 -0.84\n  # indented comment\n2 244 401 25 4 0.31\n";
    let observations: Vec<Observation> = parse_data(contents).unwrap();

    assert_eq!(observations.len(), 2);
    assert_eq!(observations[0].id, 1);
    assert_eq!(observations[1].x, 244.0);
    assert_eq!(observations[1].y, 401.0);
    assert_eq!(observations[1].sigma_y, 25.0);
    assert_eq!(observations[1].sigma_x, 4.0);
    assert_eq!(observations[1].rho_xy, 0.31);
}

#[test]
fn test_parse_data_reports_line_number() {
    let contents: &str = "# header\n1 201 592 61 9 -0.84\n2 244 401 25 4\n";
    match parse_data(contents) {
        Err(Error::Parse { line, .. }) => assert_eq!(line, 3),
        other => panic!("expected a parse error, got {:?}", other.map(|observations: Vec<Observation>| observations.len())),
    }

    let contents: &str = "1 201 abc 61 9 -0.84\n";
    assert!(matches!(parse_data(contents), Err(Error::Parse { line: 1, .. })));
}

#[test]
fn test_parse_data_rejects_invalid_covariance() {
    // A correlation outside [-1, 1] or a negative sigma_x gives a covariance that is not positive semi-definite
    let contents: &str = "# header\n1 201 592 61 9 -0.84\n2 244 401 25 4 1.2\n";
    assert!(matches!(parse_data(contents), Err(Error::Parse { line: 3, .. })));

    let contents: &str = "1 201 592 61 -9 -0.84\n";
    assert!(matches!(parse_data(contents), Err(Error::Parse { line: 1, .. })));

    let contents: &str = "1 201 592 61 9 nan\n";
    assert!(matches!(parse_data(contents), Err(Error::Parse { line: 1, .. })));

    // The limits themselves are fine
    let contents: &str = "1 201 592 61 0 -1\n2 244 401 25 4 1\n";
    assert_eq!(parse_data(contents).unwrap().len(), 2);
}

#[test]
fn test_read_shipped_data_file() {
    let path: std::path::PathBuf = Path::new(env!("CARGO_MANIFEST_DIR")).join("data").join("data_allerr.dat");
    let observations: Vec<Observation> = read_data(&path).unwrap();

    assert_eq!(observations.len(), 20);
    assert_eq!(observations[2].id, 3);
    assert_eq!(observations[2].x, 47.0);

    let missing: Result<Vec<Observation>, Error> = read_data(Path::new("does/not/exist.dat"));
    assert!(matches!(missing, Err(Error::Io { .. })));
}
