use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use irkit_core::{open_index, IndexCapability};
use tracing_subscriber::{fmt, EnvFilter};

use std::io::{self, Write};
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Parser, Debug)]
#[command(name = "dump-index")]
#[command(about = "Inspect a built index", long_about = None)]
struct Cli {
    /// Index directory
    #[arg(long)]
    index: PathBuf,
    /// Field name (metadata lookups, term analysis)
    #[arg(long)]
    field: Option<String>,
    /// External document id
    #[arg(long)]
    docno: Option<String>,
    /// Command, long or short form (e.g. `stats` or `s`)
    #[arg(long)]
    cmd: String,
    /// Command argument (term, query text, docno)
    #[arg(long)]
    arg: Option<String>,
    /// Hits printed by `search`
    #[arg(long, default_value_t = 10)]
    count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    DocumentId,
    Stats,
    DocumentVector,
    DocumentText,
    DocumentTerms,
    Metadata,
    Term,
    Postings,
    Vocabulary,
    Search,
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "document-id" | "documentid" | "di" => Command::DocumentId,
            "stats" | "s" => Command::Stats,
            "document-vector" | "documentvector" | "dv" => Command::DocumentVector,
            "document-text" | "documenttext" | "dt" => Command::DocumentText,
            "document-terms" | "documentterms" | "dterms" => Command::DocumentTerms,
            "metadata" | "m" => Command::Metadata,
            "term" | "t" | "xcount" | "x" => Command::Term,
            "postings" | "p" | "invlist" | "il" => Command::Postings,
            "vocabulary" | "v" => Command::Vocabulary,
            "search" | "q" => Command::Search,
            other => bail!("unsupported command: {other}"),
        })
    }
}

fn docno<'a>(cli: &'a Cli) -> Result<&'a str> {
    cli.docno.as_deref().or(cli.arg.as_deref()).ok_or_else(|| anyhow!("--docno (or --arg) is required"))
}

fn arg<'a>(cli: &'a Cli, what: &str) -> Result<&'a str> {
    cli.arg.as_deref().ok_or_else(|| anyhow!("--arg <{what}> is required"))
}

/// Runs the term through the field's processor, as the index saw it at build
/// time. Stop-terms come back as `None`.
fn analyzed_term(index: &dyn IndexCapability, cli: &Cli, term: &str) -> Option<String> {
    let processor = match cli.field.as_deref() {
        Some(field) => index.processor().for_field(field),
        None => index.query_processor(),
    };
    processor.terms(term).into_iter().next()
}

fn run(index: &dyn IndexCapability, cli: &Cli, cmd: Command, out: &mut impl Write) -> Result<()> {
    match cmd {
        Command::DocumentId => {
            writeln!(out, "{}", index.doc_id(docno(cli)?)?)?;
        }
        Command::Stats => {
            let meta = index.meta();
            writeln!(out, "Backend: \t{:?}", meta.backend)?;
            writeln!(out, "Documents: \t{}", index.doc_count())?;
            writeln!(out, "Unique terms: \t{}", index.term_type_count())?;
            writeln!(out, "Total terms: \t{}", index.term_count())?;
            writeln!(out, "Avg doc length: \t{:.4}", index.doc_length_avg())?;
            writeln!(out, "Fields: \t{}", meta.fields.len())?;
            writeln!(out, "Scoring: \t{}", index.scoring().name())?;
            writeln!(out, "Processor: \t{}", index.processor().default_processor().name())?;
        }
        Command::DocumentVector => {
            let fv = index.doc_vector_by_docno(docno(cli)?, None)?;
            writeln!(out, "Feature count: {}", fv.feature_count())?;
            writeln!(out, "Length {}", fv.length())?;
            write!(out, "{fv}")?;
        }
        Command::DocumentText => {
            let id = index.doc_id(docno(cli)?)?;
            writeln!(out, "{}", index.doc_text(id)?)?;
        }
        Command::DocumentTerms => {
            let id = index.doc_id(docno(cli)?)?;
            for (pos, term) in index.doc_term_positions(id)? {
                writeln!(out, "{pos}\t{term}")?;
            }
        }
        Command::Metadata => {
            let field = cli.field.as_deref().ok_or_else(|| anyhow!("--field is required"))?;
            if let Some(value) = index.metadata_value(docno(cli)?, field)? {
                writeln!(out, "{value}")?;
            }
        }
        Command::Term => {
            let raw = arg(cli, "term")?;
            match analyzed_term(index, cli, raw) {
                Some(term) => writeln!(out, "{term}\t{}\t{}", index.doc_freq(&term), index.term_freq(&term))?,
                None => writeln!(out, "{raw}\t(stopped)")?,
            }
        }
        Command::Postings => {
            let raw = arg(cli, "term")?;
            let Some(term) = analyzed_term(index, cli, raw) else { return Ok(()) };
            for (doc_id, tf) in index.docs_by_term(&term)? {
                writeln!(out, "{doc_id}\t{}\t{tf}", index.docno(doc_id)?)?;
            }
        }
        Command::Vocabulary => {
            writeln!(out, "TOTAL\t{}\t{}", index.term_count(), index.doc_count())?;
            for term in index.vocabulary()? {
                writeln!(out, "{term}\t{}\t{}", index.term_freq(&term), index.doc_freq(&term))?;
            }
        }
        Command::Search => {
            let mut hits = index.run_query_text(arg(cli, "query")?, cli.count)?;
            hits.rank();
            for (rank, hit) in hits.iter().enumerate() {
                writeln!(out, "{}\t{}\t{:.6}", rank + 1, hit.docno, hit.score)?;
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(io::stderr).init();
    let cli = Cli::parse();
    let cmd: Command = cli.cmd.parse()?;
    tracing::debug!(command = ?cmd, index = %cli.index.display(), "dispatching");

    let index = open_index(&cli.index).with_context(|| format!("opening index {}", cli.index.display()))?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run(index.as_ref(), &cli, cmd, &mut out)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use irkit_core::{
        analyze_document, create_writer, BackendKind, FieldSpec, IndexWriterConfig, PerFieldProcessor, RawDocument,
    };

    fn build(dir: &std::path::Path) -> PathBuf {
        let target = dir.join("idx");
        let fields = vec![FieldSpec::named("text"), FieldSpec { indexed: false, stored: true, ..FieldSpec::named("title") }];
        let processor = PerFieldProcessor::resolve(Some("english"), None, &fields).unwrap();
        let config = IndexWriterConfig::new("tfidf", &processor, &fields, 1 << 20);
        let mut writer = create_writer(BackendKind::Segment, &target, config).unwrap();
        for doc in [
            RawDocument::new("d1").with_field("text", "cats and more cats").with_field("title", "Felines"),
            RawDocument::new("d2").with_field("text", "a dog"),
        ] {
            writer.add_document(analyze_document(&doc, &fields, &processor)).unwrap();
        }
        writer.finish().unwrap();
        target
    }

    fn dump(index: &std::path::Path, args: &[&str]) -> Result<String> {
        let mut argv = vec!["dump-index", "--index", index.to_str().unwrap()];
        argv.extend_from_slice(args);
        let cli = Cli::try_parse_from(argv)?;
        let cmd: Command = cli.cmd.parse()?;
        let index = open_index(&cli.index)?;
        let mut out = Vec::new();
        run(index.as_ref(), &cli, cmd, &mut out)?;
        Ok(String::from_utf8(out)?)
    }

    #[test]
    fn long_and_short_names_agree() {
        assert_eq!("dv".parse::<Command>().unwrap(), Command::DocumentVector);
        assert_eq!("document-vector".parse::<Command>().unwrap(), Command::DocumentVector);
        assert_eq!("dterms".parse::<Command>().unwrap(), Command::DocumentTerms);
        assert!("frobnicate".parse::<Command>().is_err());
    }

    #[test]
    fn commands_print_index_contents() {
        let dir = tempfile::tempdir().unwrap();
        let index = build(dir.path());
        assert_eq!(dump(&index, &["--cmd", "di", "--docno", "d2"]).unwrap(), "1\n");
        assert!(dump(&index, &["--cmd", "s"]).unwrap().contains("Documents: \t2"));
        let dv = dump(&index, &["--cmd", "dv", "--docno", "d1"]).unwrap();
        assert!(dv.starts_with("Feature count: 1\nLength 2\n"));
        assert_eq!(dump(&index, &["--cmd", "m", "--docno", "d1", "--field", "title"]).unwrap(), "Felines\n");
        assert_eq!(dump(&index, &["--cmd", "t", "--arg", "Cats"]).unwrap(), "cat\t1\t2\n");
        assert_eq!(dump(&index, &["--cmd", "p", "--arg", "dogs"]).unwrap(), "1\td2\t1\n");
        assert_eq!(dump(&index, &["--cmd", "dterms", "--docno", "d1"]).unwrap(), "0\tcat\n1\tcat\n");
        assert!(dump(&index, &["--cmd", "q", "--arg", "cat"]).unwrap().starts_with("1\td1\t"));
    }

    #[test]
    fn missing_arguments_and_documents_fail() {
        let dir = tempfile::tempdir().unwrap();
        let index = build(dir.path());
        assert!(dump(&index, &["--cmd", "dv"]).is_err());
        assert!(dump(&index, &["--cmd", "m", "--docno", "d1"]).is_err());
        assert!(dump(&index, &["--cmd", "di", "--docno", "nope"]).is_err());
        assert!(dump(&index, &["--cmd", "nope"]).is_err());
        assert!(dump(&index, &["--docno", "d1"]).is_err());
    }
}
