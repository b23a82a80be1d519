use std::fs::File;
use std::io::Write;
use std::path::Path;

use bio::io::fasta;

use crate::types::{Chain, TkpError};

/// FASTA record as (identifier, residues).
pub type FastaRecord = (String, String);

/// Reads every record of a FASTA file using rust-bio.
///
/// Identifiers are the first word of the header. Residues must be ASCII.
pub fn read_fasta_records(path: &Path) -> Result<Vec<FastaRecord>, TkpError> {
    let file = File::open(path).map_err(|e| {
        TkpError::InvalidInput(format!("cannot open {}: {}", path.display(), e))
    })?;
    let reader = fasta::Reader::new(file);
    let mut records = Vec::new();

    for result in reader.records() {
        let record = result.map_err(|e| {
            TkpError::ParseError(format!("{}: {}", path.display(), e))
        })?;
        record.check().map_err(|e| {
            TkpError::ParseError(format!("{}: record {}: {}", path.display(), record.id(), e))
        })?;
        let seq = String::from_utf8(record.seq().to_vec()).map_err(|_| {
            TkpError::ParseError(format!(
                "{}: record {} is not ASCII",
                path.display(),
                record.id()
            ))
        })?;
        records.push((record.id().to_string(), seq));
    }

    Ok(records)
}

/// Writes the residues of every annotation of every chain as FASTA.
///
/// Headers are `<annotation id> <chain id> <name>`.
pub fn write_domains_fasta<W: Write>(writer: W, chains: &[Chain]) -> Result<(), TkpError> {
    let mut fasta_writer = fasta::Writer::new(writer);
    for chain in chains {
        for annotation in chain.annotations() {
            let description = format!("{} {}", chain.id, annotation.name);
            fasta_writer.write(
                &annotation.id,
                Some(description.as_str()),
                chain.subsequence(annotation).as_bytes(),
            )?;
        }
    }
    fasta_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Annotation, Category, Interval};
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    fn write_temp_fasta(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_read_fasta_records_multiple() {
        let file = write_temp_fasta(">seq1 first protein\nMKVL\nAAGI\n>seq2\nGKST\n");
        let records = read_fasta_records(file.path()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0], ("seq1".to_string(), "MKVLAAGI".to_string()));
        assert_eq!(records[1].0, "seq2");
    }

    #[test]
    fn test_read_fasta_records_empty_file() {
        let file = write_temp_fasta("");
        let records = read_fasta_records(file.path()).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_read_fasta_records_missing_file() {
        let result = read_fasta_records(Path::new("nonexistent_file.fa"));
        assert!(matches!(result, Err(TkpError::InvalidInput(_))));
    }

    #[test]
    fn test_read_fasta_records_garbage() {
        let file = write_temp_fasta("this is not fasta\n");
        assert!(read_fasta_records(file.path()).is_err());
    }

    #[test]
    fn test_write_domains_fasta() {
        let mut chain = Chain::new("p1", "MKVLAAGIVG");
        let annotation = Annotation::new(
            &chain,
            Category::Family,
            "PF1",
            Interval::new(2, 6).unwrap(),
            7.5,
        )
        .unwrap();
        chain.insert(annotation);

        let mut buffer = Vec::new();
        write_domains_fasta(&mut buffer, &[chain]).unwrap();

        let output = String::from_utf8(buffer).unwrap();
        assert_eq!(output, ">Family_PF1_2-6 p1 PF1\nVLAA\n");
    }
}
