use std::fs::File;
use std::io::{BufWriter, Write};

use crate::error::PersistenceError;

/// Writes one `epoch,error` row per entry, preceded by an `Epoch,Error` header.
pub fn write_results_csv<W: Write>(epoch_errors: &[f64], mut w: W) -> Result<(), PersistenceError> {
    writeln!(w, "Epoch,Error")?;
    for (epoch, error) in epoch_errors.iter().enumerate() {
        writeln!(w, "{epoch},{error:.10}")?;
    }
    Ok(())
}

pub fn export_results_csv(epoch_errors: &[f64], path: &str) -> Result<(), PersistenceError> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_results_csv(epoch_errors, &mut writer)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_zero_based_with_fixed_precision() {
        let mut buf = Vec::new();
        write_results_csv(&[0.5, 0.125], &mut buf).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "Epoch,Error\n0,0.5000000000\n1,0.1250000000\n"
        );
    }

    #[test]
    fn export_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("errors.csv");
        export_results_csv(&[1.0], path.to_str().unwrap()).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "Epoch,Error\n0,1.0000000000\n");
    }
}
