use std::fs;
use std::path::Path;

use irkit_core::{open_index, BackendKind, CorpusFormat, CorpusReader, Error, IndexBuildConfig};
use irkit_indexer::{reader_for, IndexBuilder};

fn write_corpus(root: &Path, format: CorpusFormat) {
    fs::create_dir_all(root).unwrap();
    match format {
        CorpusFormat::TrecText => {
            fs::write(
                root.join("ap880212"),
                "<DOC>\n<DOCNO>AP-1</DOCNO>\n<HEAD>Cats</HEAD>\n<TEXT>The cat sat on the mat.</TEXT>\n</DOC>\n\
                 <DOC>\n<DOCNO>AP-2</DOCNO>\n<TEXT>A dog chased the cat.</TEXT>\n</DOC>\n",
            )
            .unwrap();
            fs::write(root.join("ap880213"), "<DOC><DOCNO>AP-3</DOCNO><TEXT>Birds sang.</TEXT></DOC>").unwrap();
        }
        CorpusFormat::Wiki => {
            fs::write(root.join("Cat.wiki"), "Cat\nThe cat sat on the mat.\n").unwrap();
            fs::write(root.join("Dog.txt"), "Dog\nA dog chased the cat.\n").unwrap();
            fs::write(root.join("Bird.txt"), "Bird\nBirds sang.\n").unwrap();
            fs::write(root.join("notes.md"), "ignored").unwrap();
        }
        CorpusFormat::Json => {
            fs::write(
                root.join("a.json"),
                r#"[{"id": "j1", "title": "Cats", "body": "The cat sat on the mat.", "url": "http://c"},
                    {"id": "j2", "body": "A dog chased the cat."}]"#,
            )
            .unwrap();
            fs::write(root.join("b.jsonl"), "{\"id\": \"j3\", \"body\": \"Birds sang.\"}\n").unwrap();
        }
    }
}

fn config(dir: &Path, format: &str) -> IndexBuildConfig {
    IndexBuildConfig::new(dir.join("index"), dir.join("corpus"), format)
}

#[test]
fn every_format_indexes_every_document() {
    for format in CorpusFormat::ALL {
        let dir = tempfile::tempdir().unwrap();
        write_corpus(&dir.path().join("corpus"), format);
        let expected = reader_for(format).documents(&dir.path().join("corpus")).unwrap().count();

        let stats = IndexBuilder::new(config(dir.path(), format.tag())).build().unwrap();
        assert_eq!(stats.documents as usize, expected, "{format}");

        let index = open_index(dir.path().join("index")).unwrap();
        assert_eq!(index.doc_count(), expected as f64, "{format}");
        assert_eq!(index.doc_freq("cat"), 2.0, "{format}");
    }
}

#[test]
fn yaml_config_drives_fields_scoring_and_backend() {
    let dir = tempfile::tempdir().unwrap();
    write_corpus(&dir.path().join("corpus"), CorpusFormat::Json);
    let yaml = format!(
        "indexPath: {root}/index\nscoringRef: bm25\nanalyzer: english\nbackend: kv\nramBufferMb: 1\n\
         corpus:\n  path: {root}/corpus\n  type: json\n\
         fields:\n  - name: text\n  - name: title\n    analyzer: keyword\n    stored: true\n  - name: url\n    indexed: false\n    stored: true\n",
        root = dir.path().display()
    );
    let config_path = dir.path().join("build.yaml");
    fs::write(&config_path, yaml).unwrap();

    let stats = IndexBuilder::from_path(&config_path).unwrap().build().unwrap();
    assert_eq!(stats.documents, 3);

    let index = open_index(dir.path().join("index")).unwrap();
    assert_eq!(index.meta().backend, BackendKind::Kv);
    assert_eq!(index.scoring().name(), "bm25");
    assert_eq!(index.processor().for_field("title").name(), "keyword");
    // english stems, keyword keeps the title whole
    assert_eq!(index.doc_freq("bird"), 1.0);
    assert_eq!(index.doc_freq("Cats"), 1.0);
    assert_eq!(index.metadata_value("j1", "url").unwrap().as_deref(), Some("http://c"));
    assert_eq!(index.metadata_value("j2", "url").unwrap(), None);

    let mut hits = index.run_query_text("birds", 5).unwrap();
    hits.rank();
    assert_eq!(hits.hit(0).docno, "j3");
}

#[test]
fn stopword_list_on_simple_fails_without_output() {
    let dir = tempfile::tempdir().unwrap();
    write_corpus(&dir.path().join("corpus"), CorpusFormat::Wiki);
    let stop = dir.path().join("stop.txt");
    fs::write(&stop, "the\n").unwrap();
    let mut c = config(dir.path(), "wiki");
    c.analyzer = Some("simple".into());
    c.stopwords = Some(stop);

    let err = IndexBuilder::new(c).build().unwrap_err();
    assert!(matches!(err, Error::ProcessorConstruction { ref name, .. } if name == "simple"));
    assert!(!dir.path().join("index").exists());
    assert!(!dir.path().join("index.staging").exists());
    assert!(!dir.path().join("index.lock").exists());
}

#[test]
fn resolution_errors_leave_nothing_behind() {
    let dir = tempfile::tempdir().unwrap();
    write_corpus(&dir.path().join("corpus"), CorpusFormat::Wiki);

    let err = IndexBuilder::new(config(dir.path(), "warc")).build().unwrap_err();
    assert!(matches!(err, Error::UnsupportedCorpusFormat(ref t) if t == "warc"));

    let mut c = config(dir.path(), "wiki");
    c.similarity = Some("pagerank".into());
    assert!(matches!(IndexBuilder::new(c).build(), Err(Error::UnknownScoringFunction(_))));

    let mut c = config(dir.path(), "wiki");
    c.analyzer = Some("klingon".into());
    assert!(matches!(IndexBuilder::new(c).build(), Err(Error::UnknownProcessor(_))));

    let mut c = config(dir.path(), "wiki");
    c.corpus.path = dir.path().join("missing");
    assert!(matches!(IndexBuilder::new(c).build(), Err(Error::Corpus(_))));

    assert!(!dir.path().join("index").exists());
}

#[test]
fn bad_document_aborts_the_build_and_keeps_the_old_index() {
    let dir = tempfile::tempdir().unwrap();
    let corpus = dir.path().join("corpus");
    write_corpus(&corpus, CorpusFormat::TrecText);
    IndexBuilder::new(config(dir.path(), "trec-text")).build().unwrap();

    fs::write(corpus.join("ap880214"), "<DOC><TEXT>no docno</TEXT></DOC>").unwrap();
    let err = IndexBuilder::new(config(dir.path(), "trec-text")).build().unwrap_err();
    assert!(matches!(err, Error::Corpus(_)));
    assert!(!dir.path().join("index.staging").exists());
    assert_eq!(open_index(dir.path().join("index")).unwrap().doc_count(), 3.0);
}

#[test]
fn rebuild_overwrites_existing_index() {
    let dir = tempfile::tempdir().unwrap();
    let corpus = dir.path().join("corpus");
    write_corpus(&corpus, CorpusFormat::Wiki);
    IndexBuilder::new(config(dir.path(), "wiki")).build().unwrap();

    fs::remove_file(corpus.join("Bird.txt")).unwrap();
    let stats = IndexBuilder::new(config(dir.path(), "wiki")).build().unwrap();
    assert_eq!(stats.documents, 2);
    let index = open_index(dir.path().join("index")).unwrap();
    assert_eq!(index.doc_count(), 2.0);
    assert!(matches!(index.doc_id("Bird"), Err(Error::DocumentNotFound(_))));
}

#[test]
fn build_refuses_to_replace_a_directory_that_is_not_an_index() {
    let dir = tempfile::tempdir().unwrap();
    write_corpus(&dir.path().join("corpus"), CorpusFormat::Wiki);
    let data = dir.path().join("data");
    fs::create_dir_all(&data).unwrap();
    fs::write(data.join("precious.txt"), "do not delete").unwrap();

    let mut c = config(dir.path(), "wiki");
    c.index_path = data.clone();
    assert!(matches!(IndexBuilder::new(c).build(), Err(Error::WriterIo(_))));
    assert_eq!(fs::read_to_string(data.join("precious.txt")).unwrap(), "do not delete");
    assert!(!dir.path().join("data.staging").exists());
    assert!(!dir.path().join("data.lock").exists());
}
