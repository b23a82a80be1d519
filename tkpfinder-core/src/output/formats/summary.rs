use std::io::Write;

use serde::Serialize;

use crate::constants::SUMMARY_HEADER;
use crate::types::{Chain, TkpError};

/// One row of the flattened annotation table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    /// Category label; target kinase domains are reported as `Target`
    pub hmm_type: String,
    /// Source profile identifier
    pub hmm: String,
    /// Annotation identifier
    pub object_id: String,
    /// Identifier of the parent chain
    pub parent_name: String,
    /// 0-based first residue
    pub start: usize,
    /// 0-based end, exclusive
    pub end: usize,
    pub bit_score: f64,
}

/// Flattens annotated chains into one row per annotation.
///
/// Rows are sorted by parent, category label, start and annotation id, so
/// the same chains always give the same table.
#[must_use]
pub fn aggregate(chains: &[Chain]) -> Vec<SummaryRow> {
    let mut rows: Vec<SummaryRow> = chains
        .iter()
        .flat_map(|chain| {
            chain.annotations().iter().map(move |annotation| SummaryRow {
                hmm_type: annotation.category.label().to_string(),
                hmm: annotation.profile.clone(),
                object_id: annotation.id.clone(),
                parent_name: chain.id.clone(),
                start: annotation.start(),
                end: annotation.end(),
                bit_score: annotation.score,
            })
        })
        .collect();

    rows.sort_by(|a, b| {
        (&a.parent_name, &a.hmm_type, a.start, &a.object_id).cmp(&(
            &b.parent_name,
            &b.hmm_type,
            b.start,
            &b.object_id,
        ))
    });
    rows
}

/// Write the summary table as TSV with 1-based inclusive coordinates.
///
/// Bit scores are written at full precision.
pub fn write_summary<W: Write>(writer: &mut W, rows: &[SummaryRow]) -> Result<(), TkpError> {
    writeln!(writer, "{}", SUMMARY_HEADER.join("\t"))?;
    for row in rows {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            row.hmm_type,
            row.hmm,
            row.object_id,
            row.parent_name,
            row.start + 1,
            row.end,
            row.bit_score
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Annotation, Category, Interval};

    fn annotate(chain: &mut Chain, category: Category, profile: &str, start: usize, end: usize) {
        let annotation = Annotation::new(
            chain,
            category,
            profile,
            Interval::new(start, end).unwrap(),
            (end - start) as f64 / 2.0,
        )
        .unwrap();
        chain.insert(annotation);
    }

    fn create_test_chains() -> Vec<Chain> {
        let mut b = Chain::new("b", "A".repeat(700));
        annotate(&mut b, Category::Target, "PF00069", 350, 650);
        annotate(&mut b, Category::Family, "PF07714", 360, 600);
        annotate(&mut b, Category::Target, "PF00069", 0, 300);
        let mut a = Chain::new("a", "A".repeat(400));
        annotate(&mut a, Category::Motif, "PF00001", 10, 40);
        annotate(&mut a, Category::Domain, "PF00433", 300, 350);
        vec![b, a]
    }

    #[test]
    fn test_aggregate_order() {
        let rows = aggregate(&create_test_chains());

        let keys: Vec<(&str, &str, usize)> = rows
            .iter()
            .map(|r| (r.parent_name.as_str(), r.hmm_type.as_str(), r.start))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("a", "Domain", 300),
                ("a", "Motif", 10),
                ("b", "Family", 360),
                ("b", "Target", 0),
                ("b", "Target", 350),
            ]
        );
    }

    #[test]
    fn test_aggregate_is_deterministic() {
        let chains = create_test_chains();
        let mut first = Vec::new();
        let mut second = Vec::new();

        write_summary(&mut first, &aggregate(&chains)).unwrap();
        write_summary(&mut second, &aggregate(&chains)).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_write_summary() {
        let mut chain = Chain::new("p1", "A".repeat(400));
        annotate(&mut chain, Category::Target, "PF00069", 0, 300);

        let mut buffer = Vec::new();
        write_summary(&mut buffer, &aggregate(&[chain])).unwrap();

        let output = String::from_utf8(buffer).unwrap();
        assert_eq!(
            output,
            "HMM_type\tHMM\tObjectID\tParentName\tStart\tEnd\tBitScore\n\
             Target\tPF00069\tTarget_PF00069_0-300\tp1\t1\t300\t150\n"
        );
    }

    #[test]
    fn test_write_summary_keeps_score_precision() {
        let mut chain = Chain::new("p1", "A".repeat(400));
        let domain = Annotation::new(
            &chain,
            Category::Family,
            "PF07714",
            Interval::new(10, 90).unwrap(),
            37.4817,
        )
        .unwrap();
        chain.insert(domain);

        let mut buffer = Vec::new();
        write_summary(&mut buffer, &aggregate(&[chain])).unwrap();

        let output = String::from_utf8(buffer).unwrap();
        assert!(output.ends_with("\tp1\t11\t90\t37.4817\n"));
    }
}
