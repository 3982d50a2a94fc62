//! Repair of embedding file names truncated by the extraction tool.
//!
//! Matching is plain substring containment: an orphaned embedding file matches
//! an input recording when its stem (suffix removed) occurs inside the
//! recording's stem. Planning is pure; renames only happen in [`apply_repairs`].

use crate::embedding::EMBEDDING_SUFFIX;
use crate::error::{Error, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Outcome of reconciling one input recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// Exactly one orphaned embedding file matches.
    Matched(String),
    /// More than one orphaned embedding file matches.
    Ambiguous(Vec<String>),
    NotFound,
}

/// Reconcile one recording stem against orphaned embedding file names.
pub fn reconcile(original_stem: &str, orphans: &[String]) -> Reconciliation {
    let matches: Vec<String> = orphans
        .iter()
        .filter(|name| {
            let truncated = name.strip_suffix(EMBEDDING_SUFFIX).unwrap_or(name);
            !truncated.is_empty() && original_stem.contains(truncated)
        })
        .cloned()
        .collect();

    match matches.len() {
        0 => Reconciliation::NotFound,
        1 => Reconciliation::Matched(matches.into_iter().next().unwrap_or_default()),
        _ => Reconciliation::Ambiguous(matches),
    }
}

/// A pending rename inside the embeddings directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repair {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// Work out which embedding files need renaming to their canonical names.
///
/// Fails with [`Error::AmbiguousFilenameMatch`] when a recording matches more
/// than one orphan, or when one orphan is claimed by more than one recording.
/// Recordings with no match are logged and left for the store to report.
pub fn plan_repairs(input_dir: &Path, embeddings_dir: &Path) -> Result<Vec<Repair>> {
    let originals = file_names(input_dir)?;
    let embeddings = file_names(embeddings_dir)?;

    let stems: BTreeSet<String> = originals.iter().map(|n| stem(n).to_string()).collect();
    let present: BTreeSet<&str> = embeddings.iter().map(String::as_str).collect();

    // Embedding files that do not belong to any recording yet.
    let orphans: Vec<String> = embeddings
        .iter()
        .filter(|name| name.ends_with(EMBEDDING_SUFFIX))
        .filter(|name| {
            let truncated = &name[..name.len() - EMBEDDING_SUFFIX.len()];
            !stems.contains(truncated)
        })
        .cloned()
        .collect();

    let mut claims: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for original in &stems {
        let canonical = format!("{}{}", original, EMBEDDING_SUFFIX);
        if present.contains(canonical.as_str()) {
            continue;
        }
        match reconcile(original, &orphans) {
            Reconciliation::Matched(orphan) => {
                claims.entry(orphan).or_default().push(original.clone())
            }
            Reconciliation::Ambiguous(candidates) => {
                return Err(Error::AmbiguousFilenameMatch {
                    name: original.clone(),
                    candidates,
                })
            }
            Reconciliation::NotFound => {
                tracing::warn!("No embedding file found for input '{}'", original)
            }
        }
    }

    let mut repairs = Vec::with_capacity(claims.len());
    for (orphan, owners) in claims {
        if owners.len() > 1 {
            return Err(Error::AmbiguousFilenameMatch {
                name: orphan,
                candidates: owners,
            });
        }
        let to = format!("{}{}", owners[0], EMBEDDING_SUFFIX);
        repairs.push(Repair {
            from: embeddings_dir.join(&orphan),
            to: embeddings_dir.join(to),
        });
    }
    Ok(repairs)
}

/// Perform planned renames.
pub fn apply_repairs(repairs: &[Repair]) -> Result<()> {
    for repair in repairs {
        tracing::info!(
            "Renaming truncated embedding {} -> {}",
            repair.from.display(),
            repair.to.display()
        );
        std::fs::rename(&repair.from, &repair.to)?;
    }
    Ok(())
}

/// Plan and apply in one step; returns the number of renamed files.
pub fn repair_truncated_names(input_dir: &Path, embeddings_dir: &Path) -> Result<usize> {
    let repairs = plan_repairs(input_dir, embeddings_dir)?;
    apply_repairs(&repairs)?;
    Ok(repairs.len())
}

fn stem(name: &str) -> &str {
    Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name)
}

fn file_names(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            if !name.starts_with('.') {
                names.push(name.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), b"").unwrap();
    }

    fn dirs() -> (tempfile::TempDir, PathBuf, PathBuf) {
        let root = tempfile::tempdir().unwrap();
        let input = root.path().join("in");
        let embeddings = root.path().join("emb");
        std::fs::create_dir_all(&input).unwrap();
        std::fs::create_dir_all(&embeddings).unwrap();
        (root, input, embeddings)
    }

    #[test]
    fn test_reconcile_outcomes() {
        let orphans = vec![
            "electric_gui_embeddings.npy".to_string(),
            "organ_embeddings.npy".to_string(),
        ];
        assert_eq!(
            reconcile("electric_guitar_60", &orphans),
            Reconciliation::Matched("electric_gui_embeddings.npy".into())
        );
        assert_eq!(reconcile("flute_60", &orphans), Reconciliation::NotFound);

        let overlapping = vec!["org_embeddings.npy".to_string(), "organ_embeddings.npy".to_string()];
        assert!(matches!(
            reconcile("organ_72", &overlapping),
            Reconciliation::Ambiguous(c) if c.len() == 2
        ));
    }

    #[test]
    fn test_repairs_truncated_name() {
        let (_root, input, embeddings) = dirs();
        touch(&input, "electric_guitar_60.wav");
        touch(&input, "flute_60.wav");
        touch(&embeddings, "electric_guita_embeddings.npy");
        touch(&embeddings, "flute_60_embeddings.npy");

        let renamed = repair_truncated_names(&input, &embeddings).unwrap();
        assert_eq!(renamed, 1);
        assert!(embeddings.join("electric_guitar_60_embeddings.npy").exists());
        assert!(!embeddings.join("electric_guita_embeddings.npy").exists());
        assert!(embeddings.join("flute_60_embeddings.npy").exists());
    }

    #[test]
    fn test_canonical_files_are_not_candidates() {
        let (_root, input, embeddings) = dirs();
        // "flute_6" would be a substring of "flute_60" if it were treated as an orphan.
        touch(&input, "flute_6.wav");
        touch(&input, "flute_60.wav");
        touch(&embeddings, "flute_6_embeddings.npy");

        let repairs = plan_repairs(&input, &embeddings).unwrap();
        assert!(repairs.is_empty());
    }

    #[test]
    fn test_shared_orphan_is_ambiguous() {
        let (_root, input, embeddings) = dirs();
        touch(&input, "synth_pad_48.wav");
        touch(&input, "synth_pad_52.wav");
        touch(&embeddings, "synth_pad_embeddings.npy");

        match plan_repairs(&input, &embeddings) {
            Err(Error::AmbiguousFilenameMatch { name, candidates }) => {
                assert_eq!(name, "synth_pad_embeddings.npy");
                assert_eq!(candidates.len(), 2);
            }
            other => panic!("expected ambiguity, got {:?}", other),
        }
        // Nothing renamed on failure.
        assert!(embeddings.join("synth_pad_embeddings.npy").exists());
    }
}
