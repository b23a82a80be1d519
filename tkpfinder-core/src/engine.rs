use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::algorithms::{classify, extract_motif, resolve_chain_overlaps, OverlapResolver};
use crate::config::TkpConfig;
use crate::results::TkpResults;
use crate::runner::RunCoordinator;
use crate::scoring::{annotate_chains, BitCutoff, ProfileLibrary, ProfileScorer, Thresholds};
use crate::sequence::SequenceInput;
use crate::types::{Activity, Category, Chain, TkpError};

/// Per-input annotation pipeline.
///
/// One run goes through discovery of target kinase domains, annotation and
/// per-category overlap resolution with the secondary profiles, conserved
/// residue extraction and active/pseudo classification. Runs share nothing
/// but the read-only configuration, scorer and profile library.
///
/// # Examples
///
/// ```rust,no_run
/// use std::path::{Path, PathBuf};
/// use tkpfinder_core::config::TkpConfig;
/// use tkpfinder_core::engine::TkpAnnotator;
/// use tkpfinder_core::scoring::{HmmsearchScorer, ProfileLibrary};
/// use tkpfinder_core::sequence::SequenceInput;
///
/// let config = TkpConfig::default();
/// let library = ProfileLibrary::from_dir(Path::new("hmm"), &config.categories, None)?;
/// let annotator = TkpAnnotator::new(config, HmmsearchScorer::default(), library)?;
///
/// let results = annotator.annotate(SequenceInput::Fasta(PathBuf::from("proteome.fasta")))?;
/// for row in results.summary() {
///     println!("{}\t{}\t{}", row.parent_name, row.object_id, row.bit_score);
/// }
/// # Ok::<(), tkpfinder_core::types::TkpError>(())
/// ```
#[derive(Debug)]
pub struct TkpAnnotator<S: ProfileScorer> {
    config: TkpConfig,
    scorer: S,
    library: ProfileLibrary,
    resolver: OverlapResolver,
}

impl<S: ProfileScorer> TkpAnnotator<S> {
    /// Creates an annotator after validating `config`.
    ///
    /// # Errors
    ///
    /// Returns [`TkpError::InvalidConfig`] for settings that would fail
    /// every input.
    pub fn new(config: TkpConfig, scorer: S, library: ProfileLibrary) -> Result<Self, TkpError> {
        config.validate()?;
        let resolver = OverlapResolver::new(config.max_resolver_iterations);
        Ok(Self {
            config,
            scorer,
            library,
            resolver,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &TkpConfig {
        &self.config
    }

    /// Runs the full pipeline on one input.
    ///
    /// # Errors
    ///
    /// Fails for unreadable input, a failure of the target profile, or a
    /// resolver that exceeds its iteration bound. Failures of secondary
    /// profiles are logged and skipped.
    pub fn annotate(&self, input: SequenceInput) -> Result<TkpResults, TkpError> {
        let source = input.label();
        let chains = input.into_chains()?;
        info!(input = %source, chains = chains.len(), "annotating input");

        let mut chains = self.discover(chains)?;
        if chains.is_empty() {
            info!(input = %source, "Found no TKPs");
            return Ok(TkpResults::empty(source));
        }
        info!(input = %source, tkps = chains.len(), "found tandem kinase candidates");

        self.categorize(&mut chains)?;
        self.classify_domains(&mut chains);

        Ok(TkpResults { source, chains })
    }

    /// Scores chains with the target profile and keeps tandem kinases.
    ///
    /// Chains are counted twice against `min_pk_domains`: once on the raw
    /// hits, to skip resolution for hopeless chains, and once after the
    /// overlapping domains were resolved. Kept domains are labelled
    /// `<pk_name>_<k>` by position.
    pub fn discover(&self, mut chains: Vec<Chain>) -> Result<Vec<Chain>, TkpError> {
        let min_size = self.config.min_pk_domain_size;
        let min_domains = self.config.min_pk_domains;
        let thresholds = Thresholds {
            min_length: Some(min_size),
            cutoff: Some(BitCutoff::Trusted),
            ..Default::default()
        };

        annotate_chains(&mut chains, &self.scorer, &self.library.target, &thresholds)?;
        for chain in &mut chains {
            chain.retain(|a| a.category != Category::Target || a.len() >= min_size);
        }

        chains.retain(|chain| chain.count_of(Category::Target) >= min_domains);
        for chain in &mut chains {
            resolve_chain_overlaps(
                chain,
                &self.resolver,
                |a| a.category == Category::Target,
                |a| a.len() as f64,
            )?;
        }
        chains.retain(|chain| chain.count_of(Category::Target) >= min_domains);

        for chain in &mut chains {
            self.label_domains(chain);
        }
        Ok(chains)
    }

    fn label_domains(&self, chain: &mut Chain) {
        let mut starts: Vec<usize> = chain
            .annotations_of(Category::Target)
            .map(|a| a.start())
            .collect();
        starts.sort_unstable();

        for annotation in chain.annotations_mut() {
            if annotation.category != Category::Target {
                continue;
            }
            let rank = starts.partition_point(|&s| s < annotation.start()) + 1;
            annotation.name = format!("{}_{}", self.config.pk_name, rank);
        }
    }

    /// Annotates every secondary category in order and resolves overlaps
    /// within each category on each chain, by score.
    pub fn categorize(&self, chains: &mut [Chain]) -> Result<(), TkpError> {
        let thresholds = Thresholds {
            min_score: Some(self.config.min_hmm_score),
            min_coverage: Some(self.config.min_hmm_cov),
            ..Default::default()
        };

        for &category in &self.config.categories {
            let profiles = self.library.profiles(category);
            let mut added = 0;
            for profile in profiles {
                match annotate_chains(chains, &self.scorer, profile, &thresholds) {
                    Ok(n) => added += n,
                    Err(e) => warn!(profile = %profile.id, error = %e, "skipping profile"),
                }
            }

            let mut removed = 0;
            for chain in chains.iter_mut() {
                removed += resolve_chain_overlaps(
                    chain,
                    &self.resolver,
                    |a| a.category == category,
                    |a| a.score,
                )?;
            }
            debug!(
                %category,
                profiles = profiles.len(),
                added,
                removed,
                "category annotated"
            );
        }
        Ok(())
    }

    /// Extracts the conserved motif of every target domain and classifies it.
    pub fn classify_domains(&self, chains: &mut [Chain]) {
        for chain in chains.iter_mut() {
            let motifs: Vec<(String, String)> = chain
                .annotations_of(Category::Target)
                .map(|domain| {
                    (
                        domain.id.clone(),
                        extract_motif(chain, domain, &self.config.conserved_positions),
                    )
                })
                .collect();

            for annotation in chain.annotations_mut() {
                let Some((_, motif)) = motifs.iter().find(|(id, _)| *id == annotation.id) else {
                    continue;
                };
                let activity = classify(motif, &self.config.reference_motif);
                if activity == Activity::Pseudo {
                    if let Some(rest) = annotation.name.strip_prefix(&self.config.pk_name) {
                        annotation.name = format!("{}{}", self.config.ppk_name, rest);
                    }
                }
                annotation.motif = Some(motif.clone());
                annotation.activity = Some(activity);
            }
        }
    }
}

impl<S: ProfileScorer + 'static> TkpAnnotator<S> {
    /// Annotates many inputs, in parallel when configured.
    ///
    /// Returns one entry per input in input order; `None` marks an input
    /// that failed, panicked or timed out.
    ///
    /// # Errors
    ///
    /// Only fails when the worker pool cannot be created.
    pub fn annotate_batch(
        self: Arc<Self>,
        inputs: Vec<SequenceInput>,
    ) -> Result<Vec<Option<TkpResults>>, TkpError> {
        let coordinator = RunCoordinator::from_config(&self.config);
        coordinator.run(inputs, move |input| self.annotate(input))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::tests::StubScorer;
    use crate::scoring::Profile;
    use crate::types::{Annotation, Interval};
    use std::path::PathBuf;

    const TARGET: &str = "PF00069";

    /// 300 residues with Lys at 30 (Arg when inactive), HRD Asp at 123 and
    /// DFG Asp at 141.
    fn kinase_domain(active: bool) -> String {
        let mut residues = vec![b'A'; 300];
        residues[29] = if active { b'K' } else { b'R' };
        residues[122] = b'D';
        residues[140] = b'D';
        String::from_utf8(residues).unwrap()
    }

    /// Active domain at 0..300, pseudo domain at 350..650, length 700.
    fn tandem_sequence() -> String {
        format!(
            "{}{}{}{}",
            kinase_domain(true),
            "G".repeat(50),
            kinase_domain(false),
            "G".repeat(50)
        )
    }

    fn create_library() -> ProfileLibrary {
        ProfileLibrary::new(
            Profile::new(TARGET, Category::Target, 264),
            vec![
                (
                    Category::Family,
                    vec![
                        Profile::new("FAM1", Category::Family, 100),
                        Profile::new("FAM2", Category::Family, 100),
                    ],
                ),
                (Category::Domain, vec![Profile::new("DOM1", Category::Domain, 100)]),
                (Category::Motif, vec![]),
            ],
        )
    }

    fn create_annotator(scorer: StubScorer) -> TkpAnnotator<StubScorer> {
        TkpAnnotator::new(TkpConfig::default(), scorer, create_library()).unwrap()
    }

    fn records(ids: &[&str]) -> SequenceInput {
        SequenceInput::Records(
            ids.iter()
                .enumerate()
                // Distinct residues so no record is deduplicated
                .map(|(i, id)| (id.to_string(), format!("{}{}", tandem_sequence(), "W".repeat(i))))
                .collect(),
        )
    }

    fn chain<'a>(results: &'a TkpResults, id: &str) -> &'a Chain {
        results.chains.iter().find(|c| c.id == id).unwrap()
    }

    #[test]
    fn test_discovery_threshold() {
        let scorer = StubScorer::default()
            .with_hit(TARGET, "two", 0, 300, 120.0)
            .with_hit(TARGET, "two", 350, 650, 110.0)
            .with_hit(TARGET, "one", 0, 300, 120.0);
        let annotator = create_annotator(scorer);

        let results = annotator.annotate(records(&["two", "one"])).unwrap();

        let ids: Vec<&str> = results.chains.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["two"]);
        assert_eq!(results.num_domains(), 2);
    }

    #[test]
    fn test_overlap_induced_domain_loss() {
        let scorer = StubScorer::default()
            .with_hit(TARGET, "p1", 0, 300, 120.0)
            .with_hit(TARGET, "p1", 250, 550, 110.0);
        let annotator = create_annotator(scorer);

        let results = annotator.annotate(records(&["p1"])).unwrap();

        assert!(results.is_empty());
    }

    #[test]
    fn test_short_domains_do_not_count() {
        let scorer = StubScorer::default()
            .with_hit(TARGET, "p1", 0, 300, 120.0)
            .with_hit(TARGET, "p1", 350, 499, 110.0);
        let annotator = create_annotator(scorer);

        assert!(annotator.annotate(records(&["p1"])).unwrap().is_empty());
    }

    #[test]
    fn test_no_hits_is_empty_result() {
        let annotator = create_annotator(StubScorer::default());
        let results = annotator.annotate(records(&["p1", "p2"])).unwrap();

        assert!(results.is_empty());
        assert_eq!(results.source, "<2 records>");
    }

    #[test]
    fn test_domains_are_labelled_and_classified() {
        let scorer = StubScorer::default()
            .with_hit(TARGET, "p1", 350, 650, 110.0)
            .with_hit(TARGET, "p1", 0, 300, 120.0);
        let annotator = create_annotator(scorer);

        let results = annotator.annotate(records(&["p1"])).unwrap();
        let p1 = chain(&results, "p1");

        let first = p1.get("Target_PF00069_0-300").unwrap();
        assert_eq!(first.name, "PK_1");
        assert_eq!(first.motif.as_deref(), Some("KAAADDAA"));
        assert_eq!(first.activity, Some(Activity::Active));

        let second = p1.get("Target_PF00069_350-650").unwrap();
        assert_eq!(second.name, "PPK_2");
        assert_eq!(second.motif.as_deref(), Some("RAAADDAA"));
        assert_eq!(second.activity, Some(Activity::Pseudo));
    }

    #[test]
    fn test_numbering_places_conserved_residues_after_inserts() {
        // Two inserted residues ahead of the first domain shift Lys to 32
        let seq = format!("GG{}", tandem_sequence());
        let mut numbering = vec![None, None];
        numbering.extend((1..=300).map(Some));
        let scorer = StubScorer::default()
            .with_numbered_hit(TARGET, "p1", Interval::new(0, 302).unwrap(), 120.0, numbering)
            .with_hit(TARGET, "p1", 352, 652, 110.0);
        let annotator = create_annotator(scorer);

        let results = annotator
            .annotate(SequenceInput::Records(vec![("p1".to_string(), seq)]))
            .unwrap();
        let first = chain(&results, "p1").get("Target_PF00069_0-302").unwrap();

        assert!(first.numbering.is_some());
        assert_eq!(first.motif.as_deref(), Some("KAAADDAA"));
        assert_eq!(first.activity, Some(Activity::Active));
        assert_eq!(first.name, "PK_1");
    }

    #[test]
    fn test_resolver_bound_follows_config() {
        let config = TkpConfig {
            max_resolver_iterations: 3,
            ..Default::default()
        };
        let scorer = StubScorer::default()
            .with_hit(TARGET, "p1", 0, 300, 120.0)
            .with_hit(TARGET, "p1", 350, 650, 110.0);
        let annotator = TkpAnnotator::new(config, scorer, create_library()).unwrap();

        assert_eq!(annotator.resolver.max_iterations(), 3);
        assert_eq!(annotator.config().max_resolver_iterations, 3);
        let result = annotator.annotate(records(&["p1"]));
        assert!(matches!(result, Err(TkpError::ConvergenceError { limit: 3, .. })));
    }

    #[test]
    fn test_annotation_past_chain_end_fails_input() {
        let mut stored = Chain::new("p1", "A".repeat(20));
        let domain =
            Annotation::new(&stored, Category::Target, TARGET, Interval::new(0, 20).unwrap(), 50.0)
                .unwrap();
        stored.insert(domain);
        let mut json = serde_json::to_string(&stored).unwrap();
        json = json.replace(r#""end":20"#, r#""end":500"#);
        let corrupted: Chain = serde_json::from_str(&json).unwrap();

        let annotator = create_annotator(StubScorer::default());
        let result = annotator.annotate(SequenceInput::Chains(vec![corrupted]));
        assert!(matches!(result, Err(TkpError::InvalidInput(_))));
    }

    #[test]
    fn test_categories_are_resolved_independently() {
        let scorer = StubScorer::default()
            .with_hit(TARGET, "p1", 0, 300, 120.0)
            .with_hit(TARGET, "p1", 350, 650, 110.0)
            .with_hit("FAM1", "p1", 0, 100, 30.0)
            .with_hit("FAM2", "p1", 50, 150, 40.0)
            .with_hit("DOM1", "p1", 60, 160, 10.0);
        let annotator = create_annotator(scorer);

        let results = annotator.annotate(records(&["p1"])).unwrap();
        let p1 = chain(&results, "p1");

        let family: Vec<&str> = p1
            .annotations_of(Category::Family)
            .map(|a| a.profile.as_str())
            .collect();
        assert_eq!(family, vec!["FAM2"]);
        assert_eq!(p1.count_of(Category::Domain), 1);
        assert_eq!(p1.count_of(Category::Target), 2);
    }

    #[test]
    fn test_secondary_thresholds() {
        let scorer = StubScorer::default()
            .with_hit(TARGET, "p1", 0, 300, 120.0)
            .with_hit(TARGET, "p1", 350, 650, 110.0)
            .with_hit("FAM1", "p1", 0, 40, 30.0) // coverage 0.4
            .with_hit("DOM1", "p1", 400, 500, -1.0); // negative score
        let annotator = create_annotator(scorer);

        let results = annotator.annotate(records(&["p1"])).unwrap();
        let p1 = chain(&results, "p1");

        assert_eq!(p1.annotations().len(), 2);
    }

    #[test]
    fn test_secondary_failure_is_tolerated() {
        let scorer = StubScorer::default()
            .with_hit(TARGET, "p1", 0, 300, 120.0)
            .with_hit(TARGET, "p1", 350, 650, 110.0)
            .with_hit("FAM2", "p1", 0, 100, 40.0)
            .failing_on("FAM1");
        let annotator = create_annotator(scorer);

        let results = annotator.annotate(records(&["p1"])).unwrap();

        assert_eq!(chain(&results, "p1").count_of(Category::Family), 1);
        let calls = annotator.scorer.calls.lock().unwrap();
        assert_eq!(*calls, vec![TARGET, "FAM1", "FAM2", "DOM1"]);
    }

    #[test]
    fn test_target_failure_fails_input() {
        let annotator = create_annotator(StubScorer::default().failing_on(TARGET));
        let result = annotator.annotate(records(&["p1"]));
        assert!(matches!(result, Err(TkpError::ScoringError { .. })));
    }

    #[test]
    fn test_annotation_is_idempotent_for_annotated_chains() {
        let scorer = StubScorer::default()
            .with_hit(TARGET, "p1", 0, 300, 120.0)
            .with_hit(TARGET, "p1", 350, 650, 110.0)
            .with_hit("DOM1", "p1", 0, 100, 10.0);
        let annotator = create_annotator(scorer);

        let first = annotator.annotate(records(&["p1"])).unwrap();
        let second = annotator
            .annotate(SequenceInput::Chains(first.chains.clone()))
            .unwrap();

        assert_eq!(first.summary(), second.summary());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = TkpConfig {
            reference_motif: "KXD".to_string(),
            ..Default::default()
        };
        let result = TkpAnnotator::new(config, StubScorer::default(), create_library());
        assert!(matches!(result, Err(TkpError::InvalidConfig(_))));
    }

    #[test]
    fn test_batch_isolates_corrupted_input() {
        let scorer = StubScorer::default()
            .with_hit(TARGET, "a", 0, 300, 120.0)
            .with_hit(TARGET, "a", 350, 650, 110.0)
            .with_hit(TARGET, "c", 0, 300, 120.0)
            .with_hit(TARGET, "c", 350, 650, 110.0);
        let config = TkpConfig {
            num_workers: Some(2),
            ..Default::default()
        };
        let annotator = Arc::new(TkpAnnotator::new(config, scorer, create_library()).unwrap());

        let inputs = vec![
            records(&["a"]),
            SequenceInput::Fasta(PathBuf::from("missing/corrupted.fasta")),
            records(&["c"]),
        ];
        let results = annotator.annotate_batch(inputs).unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().chains[0].id, "a");
        assert!(results[1].is_none());
        assert_eq!(results[2].as_ref().unwrap().chains[0].id, "c");
    }

    #[test]
    fn test_discover_keeps_interval_of_existing_domains() {
        let scorer = StubScorer::default()
            .with_hit(TARGET, "p1", 0, 300, 120.0)
            .with_hit(TARGET, "p1", 350, 650, 110.0);
        let annotator = create_annotator(scorer);

        let chains = annotator
            .discover(vec![Chain::new("p1", tandem_sequence())])
            .unwrap();

        let intervals: Vec<Interval> = chains[0]
            .annotations_of(Category::Target)
            .map(|a| a.interval)
            .collect();
        assert_eq!(
            intervals,
            vec![Interval::new(0, 300).unwrap(), Interval::new(350, 650).unwrap()]
        );
    }
}
