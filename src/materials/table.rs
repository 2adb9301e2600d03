//! Shared line format for the four on-disk table kinds (Palik, NFF,
//! Cromer, Molec). All four are whitespace-separated `energy a b`
//! triples after a fixed number of header lines; what `a`/`b` mean
//! (already n,k or raw f1,f2 scattering factors) depends on the kind
//! and is resolved by the caller in `mod.rs`.

use super::MaterialError;

#[derive(Clone, Copy, Debug)]
pub struct RawEntry {
    pub energy: f64,
    pub a: f64,
    pub b: f64,
}

/// Number of leading lines to skip before data rows begin.
#[derive(Clone, Copy, Debug)]
pub enum TableFormat {
    /// `.NKP` files: 3 header lines.
    Palik,
    /// `.nff` files: 1 header line.
    Nff,
    /// `.f12` files: 3 header lines.
    Cromer,
    /// `.NKM` files: 2 header lines.
    Molec,
}

impl TableFormat {
    fn header_lines(self) -> usize {
        match self {
            TableFormat::Palik => 3,
            TableFormat::Nff => 1,
            TableFormat::Cromer => 3,
            TableFormat::Molec => 2,
        }
    }

    pub fn data_root_subdir(self) -> &'static str {
        match self {
            TableFormat::Palik => "PALIK",
            TableFormat::Nff => "nff",
            TableFormat::Cromer => "CROMER",
            TableFormat::Molec => "MOLEC",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            TableFormat::Palik => "NKP",
            TableFormat::Nff => "nff",
            TableFormat::Cromer => "f12",
            TableFormat::Molec => "NKM",
        }
    }
}

/// Parses the body of a table file already read into memory.
///
/// A malformed data row is a [`MaterialError::ParseError`]; the file
/// simply not being found is handled one level up in `mod.rs` and is
/// not an error.
pub fn parse(element: &str, format: TableFormat, contents: &str) -> Result<Vec<RawEntry>, MaterialError> {
    let mut out = Vec::new();
    for (idx, line) in contents.lines().enumerate().skip(format.header_lines()) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut fields = line.split_whitespace();
        let (Some(e), Some(a), Some(b)) = (fields.next(), fields.next(), fields.next()) else {
            return Err(MaterialError::ParseError {
                element: element.to_string(),
                table: format.extension().to_string(),
                line: idx + 1,
            });
        };
        let parsed = (|| -> Option<RawEntry> {
            Some(RawEntry { energy: e.parse().ok()?, a: a.parse().ok()?, b: b.parse().ok()? })
        })();
        match parsed {
            Some(entry) => out.push(entry),
            None => {
                return Err(MaterialError::ParseError {
                    element: element.to_string(),
                    table: format.extension().to_string(),
                    line: idx + 1,
                })
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_palik_style_body() {
        let body = "header\nheader\nheader\n100.0 0.9 0.01\n200.0 0.95 0.02\n";
        let entries = parse("CU", TableFormat::Palik, body).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].energy, 100.0);
        assert_eq!(entries[1].b, 0.02);
    }

    #[test]
    fn blank_lines_are_skipped() {
        let body = "header\n\n1.0 2.0 3.0\n\n";
        let entries = parse("FE", TableFormat::Nff, body).unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn malformed_row_is_a_parse_error() {
        let body = "h\nh\nh\nnot a number here\n";
        let err = parse("AU", TableFormat::Cromer, body).unwrap_err();
        assert!(matches!(err, MaterialError::ParseError { .. }));
    }
}
