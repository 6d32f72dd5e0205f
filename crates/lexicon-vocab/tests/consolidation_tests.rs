//! Consolidation into a master vocabulary, end to end on disk.

use lexicon_vocab::consolidate::latest_backup_path;
use lexicon_vocab::{
    consolidate, AxisScores, Blocklist, PartOfSpeech, VocabularyEntry, VocabularyOutput,
};
use std::fs;
use std::path::{Path, PathBuf};

fn entry(canonical: &str, source: &str, confidence: f64) -> VocabularyEntry {
    VocabularyEntry {
        id: format!("{source}-{canonical}"),
        text: canonical.to_string(),
        source: source.to_string(),
        genre: "fantasy".into(),
        intent: "offensive".into(),
        pos: PartOfSpeech::Noun,
        axes: AxisScores::new(),
        tags: Vec::new(),
        category: "spell".into(),
        canonical: canonical.to_string(),
        mood: "arcane".into(),
        energy: String::new(),
        confidence,
        secondary_intents: Vec::new(),
        ip_flag: None,
    }
}

fn write_vocab(dir: &Path, name: &str, entries: Vec<VocabularyEntry>) -> PathBuf {
    let path = dir.join(format!("{name}.vocab.json"));
    VocabularyOutput::from_entries(format!("{name}.pdf"), "hash", entries)
        .write_to(&path)
        .unwrap();
    path
}

#[test]
fn duplicate_canonicals_merge_into_one_entry() {
    let dir = tempfile::tempdir().unwrap();
    let mut low = entry("fireball", "doc1", 0.7);
    low.mood = "chaotic".into();
    low.category = "effect".into();
    let mut high = entry("fireball", "doc2", 0.95);
    high.mood = "destructive".into();
    high.category = "spell".into();

    let files = vec![
        write_vocab(dir.path(), "doc1", vec![low]),
        write_vocab(dir.path(), "doc2", vec![high]),
    ];
    let master_path = dir.path().join("master.vocab.json");
    let summary = consolidate(&files, &master_path, None).unwrap();

    let master = VocabularyOutput::read_from(&master_path).unwrap();
    assert_eq!(master.entries.len(), 1);
    let fireball = &master.entries[0];
    assert_eq!(fireball.source, "doc1; doc2");
    assert!(fireball.confidence >= 0.7 && fireball.confidence <= 0.95);
    assert_eq!(fireball.mood, "destructive");
    assert_eq!(fireball.category, "spell");
    assert_eq!(master.metadata.source_path, "consolidated");
    assert_eq!(summary.added.iter().collect::<Vec<_>>(), vec!["fireball"]);
}

#[test]
fn change_report_against_existing_master() {
    let dir = tempfile::tempdir().unwrap();
    let master_path = dir.path().join("master.vocab.json");

    let first = vec![write_vocab(dir.path(), "bestiary", vec![entry("dragon", "bestiary", 0.9)])];
    consolidate(&first, &master_path, None).unwrap();

    let second = vec![write_vocab(
        dir.path(),
        "bestiary",
        vec![entry("dragon", "bestiary", 0.9), entry("phoenix", "bestiary", 0.8)],
    )];
    let summary = consolidate(&second, &master_path, None).unwrap();

    assert_eq!(summary.added.iter().collect::<Vec<_>>(), vec!["phoenix"]);
    assert!(summary.updated.is_empty());
    assert!(summary.removed.is_empty());
}

#[test]
fn updated_and_removed_are_reported() {
    let dir = tempfile::tempdir().unwrap();
    let master_path = dir.path().join("master.vocab.json");

    let files = vec![write_vocab(
        dir.path(),
        "grimoire",
        vec![entry("ward", "grimoire", 0.6), entry("hex", "grimoire", 0.5)],
    )];
    consolidate(&files, &master_path, None).unwrap();

    let files = vec![write_vocab(dir.path(), "grimoire", vec![entry("ward", "grimoire", 0.8)])];
    let summary = consolidate(&files, &master_path, None).unwrap();

    assert_eq!(summary.updated.iter().collect::<Vec<_>>(), vec!["ward"]);
    assert_eq!(summary.removed.iter().collect::<Vec<_>>(), vec!["hex"]);
    assert!(summary.added.is_empty());
}

#[test]
fn ip_flag_alone_is_not_an_update() {
    let dir = tempfile::tempdir().unwrap();
    let master_path = dir.path().join("master.vocab.json");
    let files = vec![write_vocab(dir.path(), "mm", vec![entry("beholder", "mm", 0.9)])];

    consolidate(&files, &master_path, None).unwrap();

    let blocklist = Blocklist::from_franchises(vec![("dnd", vec!["beholder"])]).unwrap();
    let summary = consolidate(&files, &master_path, Some(&blocklist)).unwrap();

    assert!(summary.updated.is_empty());
    assert!(summary.is_empty());
    assert_eq!(summary.flagged.iter().collect::<Vec<_>>(), vec!["beholder"]);

    let master = VocabularyOutput::read_from(&master_path).unwrap();
    assert_eq!(master.entries[0].ip_flag.as_deref(), Some("blocklist:dnd"));
    assert_eq!(master.metadata.flagged_count, 1);
}

#[test]
fn existing_flag_is_not_overridden_by_blocklist() {
    let dir = tempfile::tempdir().unwrap();
    let master_path = dir.path().join("master.vocab.json");
    let flagged = entry("beholder", "mm", 0.9)
        .with_ip_flag(Some("classification:trademarked monster".into()));
    let files = vec![write_vocab(dir.path(), "mm", vec![flagged])];

    let blocklist = Blocklist::from_franchises(vec![("dnd", vec!["beholder"])]).unwrap();
    consolidate(&files, &master_path, Some(&blocklist)).unwrap();

    let master = VocabularyOutput::read_from(&master_path).unwrap();
    assert_eq!(
        master.entries[0].ip_flag.as_deref(),
        Some("classification:trademarked monster")
    );
}

#[test]
fn master_is_sorted_and_counted() {
    let dir = tempfile::tempdir().unwrap();
    let master_path = dir.path().join("master.vocab.json");
    let files = vec![
        write_vocab(dir.path(), "b", vec![entry("zephyr", "b", 0.9), entry("ash", "b", 0.2)]),
        write_vocab(dir.path(), "a", vec![entry("mist", "a", 0.5)]),
    ];
    consolidate(&files, &master_path, None).unwrap();

    let master = VocabularyOutput::read_from(&master_path).unwrap();
    let canonicals: Vec<&str> = master.entries.iter().map(|e| e.canonical.as_str()).collect();
    assert_eq!(canonicals, vec!["ash", "mist", "zephyr"]);
    assert_eq!(master.metadata.term_count, 3);
    assert_eq!(master.metadata.classified_count, 2);
}

#[test]
fn latest_backup_holds_state_before_second_write() {
    let dir = tempfile::tempdir().unwrap();
    let master_path = dir.path().join("master.vocab.json");
    fs::write(&master_path, r#"{"metadata": {"source_path": "consolidated", "source_hash": "", "extracted_at": "2024-01-01T00:00:00Z", "term_count": 0, "classified_count": 0}, "entries": []}"#).unwrap();

    let first = vec![write_vocab(dir.path(), "one", vec![entry("dragon", "one", 0.9)])];
    consolidate(&first, &master_path, None).unwrap();
    let after_first = fs::read_to_string(&master_path).unwrap();

    let second = vec![write_vocab(dir.path(), "one", vec![entry("phoenix", "one", 0.9)])];
    consolidate(&second, &master_path, None).unwrap();

    let bak_files: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| name == "master.vocab.json.bak")
        .collect();
    assert_eq!(bak_files.len(), 1);
    assert_eq!(
        fs::read_to_string(latest_backup_path(&master_path)).unwrap(),
        after_first
    );
}

#[test]
fn unreadable_input_leaves_master_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let master_path = dir.path().join("master.vocab.json");
    let good = vec![write_vocab(dir.path(), "good", vec![entry("dragon", "good", 0.9)])];
    consolidate(&good, &master_path, None).unwrap();
    let before = fs::read_to_string(&master_path).unwrap();

    let broken = dir.path().join("broken.vocab.json");
    fs::write(&broken, "{ truncated").unwrap();
    let files = vec![good[0].clone(), broken];
    assert!(consolidate(&files, &master_path, None).is_err());

    assert_eq!(fs::read_to_string(&master_path).unwrap(), before);
}
