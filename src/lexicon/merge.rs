//! Merging entries from all sources into one lexicon.
//!
//! Entries are grouped by collation key. Within a group, candidates are
//! ordered by `(source_priority, sequence, content)`: the order only depends
//! on the multiset of input entries, never on which worker delivered them
//! first. Senses are concatenated in that order with duplicate glosses
//! removed, and variant forms become aliases unless they collide with a
//! primary headword.

use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use log::{debug, info};

use crate::lexicon::collation::Collation;
use crate::lexicon::translit::transliterate;
use crate::lexicon::types::language::LanguagePair;
use crate::lexicon::types::models::{Entry, PartOfSpeech};

/// Diagnostics collected while merging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub input_entries: u64,
    pub dropped_empty_headword: u64,
    pub dropped_without_senses: u64,
    pub duplicate_senses: u64,
    /// Groups whose candidates disagreed on a known part of speech.
    pub pos_conflicts: u64,
    pub merged_entries: u64,
    pub aliases: u64,
    /// Variants dropped because they are a primary headword themselves.
    pub aliases_colliding: u64,
    /// Variants claimed by more than one primary and lost to another claimant.
    pub aliases_contested: u64,
}

impl fmt::Display for MergeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} entries in, {} merged, {} aliases ({} dropped empty, {} without senses, {} duplicate senses, {} colliding aliases)",
            self.input_entries,
            self.merged_entries,
            self.aliases,
            self.dropped_empty_headword,
            self.dropped_without_senses,
            self.duplicate_senses,
            self.aliases_colliding
        )
    }
}

/// Deduplicated entries sorted by key bytes, plus the alias table.
///
/// Every alias maps to exactly one primary key present in `entries`, and no
/// alias key is also a primary key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergedLexicon {
    entries: Vec<Entry>,
    aliases: BTreeMap<String, String>,
    stats: MergeStats,
}

impl MergedLexicon {
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Alias key → primary key, ascending by alias key.
    pub fn aliases(&self) -> &BTreeMap<String, String> {
        &self.aliases
    }

    pub fn stats(&self) -> &MergeStats {
        &self.stats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up a primary entry by key, following an alias if needed.
    pub fn get(&self, key: &str) -> Option<&Entry> {
        let key = self.aliases.get(key).map(String::as_str).unwrap_or(key);
        self.entries
            .binary_search_by(|entry| entry.headword.as_str().cmp(key))
            .ok()
            .map(|i| &self.entries[i])
    }

    /// Keeps the first `max_entries` entries and the aliases that still point
    /// at one of them.
    pub fn truncate(&mut self, max_entries: usize) {
        if self.entries.len() <= max_entries {
            return;
        }
        let removed: BTreeSet<String> = self.entries.drain(max_entries..).map(|e| e.headword).collect();
        self.aliases.retain(|_, primary| !removed.contains(primary));
        self.stats.merged_entries = self.entries.len() as u64;
        self.stats.aliases = self.aliases.len() as u64;
        info!("Lexicon truncated to {} entries, {} aliases", self.entries.len(), self.aliases.len());
    }
}

/// Total order on candidates of one group.
fn candidate_order(a: &Entry, b: &Entry) -> Ordering {
    (a.source_priority, a.sequence)
        .cmp(&(b.source_priority, b.sequence))
        .then_with(|| a.display_form.cmp(&b.display_form))
        .then_with(|| a.senses.cmp(&b.senses))
        .then_with(|| a.part_of_speech.cmp(&b.part_of_speech))
        .then_with(|| a.variant_forms.cmp(&b.variant_forms))
        .then_with(|| a.transliteration.cmp(&b.transliteration))
}

/// A group reduced to one entry, before aliases are assigned.
struct Reduced {
    entry: Entry,
    /// Alias key → (best claimant priority, surface forms).
    variants: BTreeMap<String, (u32, BTreeSet<String>)>,
}

fn reduce_group(key: String, mut candidates: Vec<Entry>, collation: &Collation, stats: &mut MergeStats) -> Option<Reduced> {
    candidates.sort_by(candidate_order);

    let mut senses = Vec::new();
    let mut seen_glosses = BTreeSet::new();
    for sense in candidates.iter().flat_map(|c| &c.senses) {
        if seen_glosses.insert(sense.normalized_gloss()) {
            senses.push(sense.clone());
        } else {
            stats.duplicate_senses += 1;
        }
    }

    let mut variants: BTreeMap<String, (u32, BTreeSet<String>)> = BTreeMap::new();
    for candidate in &candidates {
        for form in &candidate.variant_forms {
            let variant_key = collation.key(form);
            if variant_key.is_empty() || variant_key == key {
                continue;
            }
            let slot = variants
                .entry(variant_key)
                .or_insert_with(|| (candidate.source_priority, BTreeSet::new()));
            slot.0 = slot.0.min(candidate.source_priority);
            slot.1.insert(form.clone());
        }
    }

    if senses.is_empty() {
        stats.dropped_without_senses += 1;
        debug!("Dropping '{}': no senses after merge", key);
        return None;
    }

    // Highest priority first; among equal priorities the candidate with more senses.
    let pos = candidates
        .iter()
        .enumerate()
        .filter(|(_, c)| c.part_of_speech.is_known())
        .min_by_key(|(i, c)| (c.source_priority, Reverse(c.senses.len()), *i))
        .map(|(_, c)| c.part_of_speech)
        .unwrap_or(PartOfSpeech::Unknown);
    let known: BTreeSet<PartOfSpeech> = candidates
        .iter()
        .map(|c| c.part_of_speech)
        .filter(|p| p.is_known())
        .collect();
    if known.len() > 1 {
        stats.pos_conflicts += 1;
    }

    let primary = candidates
        .iter()
        .find(|c| !c.senses.is_empty())
        .or(candidates.first())?;
    let mut entry = Entry::new(primary.display_form.clone(), pos, primary.source_priority);
    entry.headword = key;
    entry.sequence = primary.sequence;
    entry.senses = senses;

    Some(Reduced { entry, variants })
}

/// Merges `entries` into a sorted, deduplicated lexicon for `pair`.
///
/// Never fails: entries without a usable key or without senses are dropped
/// and counted in [`MergeStats`].
pub fn merge(entries: impl IntoIterator<Item = Entry>, pair: &LanguagePair, collation: &Collation) -> MergedLexicon {
    let mut stats = MergeStats::default();
    let mut groups: BTreeMap<String, Vec<Entry>> = BTreeMap::new();

    for mut entry in entries {
        stats.input_entries += 1;
        entry.display_form = entry.display_form.trim().to_string();
        let key = collation.key(&entry.display_form);
        if key.is_empty() {
            stats.dropped_empty_headword += 1;
            continue;
        }
        groups.entry(key).or_default().push(entry);
    }
    info!("Merging {} entries in {} groups for {}", stats.input_entries, groups.len(), pair);

    let mut reduced: BTreeMap<String, Reduced> = BTreeMap::new();
    for (key, candidates) in groups {
        if let Some(group) = reduce_group(key.clone(), candidates, collation, &mut stats) {
            reduced.insert(key, group);
        }
    }

    // Alias claims: alias key → (claimant priority, primary key, surface forms).
    let mut claims: BTreeMap<String, (u32, &String, &BTreeSet<String>)> = BTreeMap::new();
    for (primary_key, group) in &reduced {
        for (alias_key, (priority, forms)) in &group.variants {
            if reduced.contains_key(alias_key) {
                stats.aliases_colliding += 1;
                continue;
            }
            match claims.get_mut(alias_key) {
                Some(claim) => {
                    stats.aliases_contested += 1;
                    if (*priority, primary_key) < (claim.0, claim.1) {
                        *claim = (*priority, primary_key, forms);
                    }
                }
                None => {
                    claims.insert(alias_key.clone(), (*priority, primary_key, forms));
                }
            }
        }
    }
    let claims: Vec<(String, String, BTreeSet<String>)> = claims
        .into_iter()
        .map(|(alias_key, (_, primary_key, forms))| (alias_key, primary_key.clone(), forms.clone()))
        .collect();

    let mut aliases = BTreeMap::new();
    for (alias_key, primary_key, forms) in claims {
        if let Some(group) = reduced.get_mut(&primary_key) {
            group.entry.variant_forms.extend(forms);
        }
        aliases.insert(alias_key, primary_key);
    }

    let entries: Vec<Entry> = reduced
        .into_values()
        .map(|group| {
            let mut entry = group.entry;
            if let Some(script) = pair.transliteration_script(&entry.display_form) {
                let latin = transliterate(&entry.display_form, script);
                if latin != entry.display_form {
                    entry.transliteration = Some(latin);
                }
            }
            entry
        })
        .collect();

    stats.merged_entries = entries.len() as u64;
    stats.aliases = aliases.len() as u64;
    info!("Merge finished: {}", stats);

    MergedLexicon { entries, aliases, stats }
}
