use std::io::Write;

use crate::types::{Category, Chain, TkpError};

const MOTIFS_HEADER: [&str; 4] = ["ObjectID", "ParentName", "Motif", "Active"];

/// Write the conserved motif and activity of every target domain
pub fn write_motifs<W: Write>(writer: &mut W, chains: &[Chain]) -> Result<(), TkpError> {
    writeln!(writer, "{}", MOTIFS_HEADER.join("\t"))?;
    for chain in chains {
        let mut domains: Vec<_> = chain.annotations_of(Category::Target).collect();
        domains.sort_by_key(|d| d.interval);
        for domain in domains {
            let active = domain
                .activity
                .map_or("-", |activity| if activity.is_active() { "true" } else { "false" });
            writeln!(
                writer,
                "{}\t{}\t{}\t{}",
                domain.id,
                chain.id,
                domain.motif_label(),
                active
            )?;
        }
    }
    Ok(())
}
