//! Name → constructor table for processors.
//!
//! Each entry may offer two construction profiles: against a stop list
//! (`with_stopwords`) and by name alone (`plain`). A request for a profile the
//! entry lacks fails with [`Error::ProcessorConstruction`].

use lazy_static::lazy_static;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use crate::analysis::processors::{KeywordProcessor, SimpleProcessor, StandardProcessor, WhitespaceProcessor};
use crate::analysis::{ProcessorSpec, ResolvedProcessor, Stopper, TextProcessor};
use crate::error::{Error, Result};

pub const DEFAULT_PROCESSOR: &str = "standard";

type WithStopwords = fn(Stopper) -> Arc<dyn TextProcessor>;
type Plain = fn() -> Arc<dyn TextProcessor>;

struct Registration {
    with_stopwords: Option<WithStopwords>,
    plain: Option<Plain>,
}

fn standard(s: Stopper) -> Arc<dyn TextProcessor> { Arc::new(StandardProcessor::new("standard", s, false)) }
fn standard_plain() -> Arc<dyn TextProcessor> { standard(Stopper::english()) }
fn english(s: Stopper) -> Arc<dyn TextProcessor> { Arc::new(StandardProcessor::new("english", s, true)) }
fn english_plain() -> Arc<dyn TextProcessor> { english(Stopper::english()) }
fn stop(s: Stopper) -> Arc<dyn TextProcessor> { Arc::new(StandardProcessor::new("stop", s, false)) }
fn simple() -> Arc<dyn TextProcessor> { Arc::new(SimpleProcessor) }
fn whitespace() -> Arc<dyn TextProcessor> { Arc::new(WhitespaceProcessor) }
fn keyword() -> Arc<dyn TextProcessor> { Arc::new(KeywordProcessor) }

lazy_static! {
    static ref REGISTRY: BTreeMap<&'static str, Registration> = {
        let mut m = BTreeMap::new();
        m.insert("standard", Registration { with_stopwords: Some(standard as WithStopwords), plain: Some(standard_plain as Plain) });
        m.insert("english", Registration { with_stopwords: Some(english as WithStopwords), plain: Some(english_plain as Plain) });
        m.insert("stop", Registration { with_stopwords: Some(stop as WithStopwords), plain: None });
        m.insert("simple", Registration { with_stopwords: None, plain: Some(simple as Plain) });
        m.insert("whitespace", Registration { with_stopwords: None, plain: Some(whitespace as Plain) });
        m.insert("keyword", Registration { with_stopwords: None, plain: Some(keyword as Plain) });
        m
    };
}

pub fn registered_processors() -> Vec<&'static str> {
    REGISTRY.keys().copied().collect()
}

fn canonical(name: Option<&str>) -> String {
    match name.map(str::trim) {
        None | Some("") => DEFAULT_PROCESSOR.to_string(),
        Some(n) => n.to_lowercase(),
    }
}

fn lookup(name: &str) -> Result<&'static Registration> {
    REGISTRY.get(name).ok_or_else(|| Error::UnknownProcessor(name.to_string()))
}

fn construct(name: String, reg: &Registration, stopper: Option<Stopper>) -> Result<ResolvedProcessor> {
    let (processor, stopwords) = match stopper {
        Some(stopper) => {
            let build = reg.with_stopwords.ok_or_else(|| Error::processor(&name, "does not accept a stopword list"))?;
            let words = stopper.to_sorted_vec();
            (build(stopper), Some(words))
        }
        None => {
            let build = reg.plain.ok_or_else(|| Error::processor(&name, "requires a stopword list"))?;
            (build(), None)
        }
    };
    Ok(ResolvedProcessor { spec: ProcessorSpec { name, stopwords }, processor })
}

/// Resolves `name` (default processor when empty) with an optional external
/// stop list. The name and profile are checked before the list is read.
pub fn resolve_processor(name: Option<&str>, stopwords: Option<&Path>) -> Result<ResolvedProcessor> {
    let name = canonical(name);
    let reg = lookup(&name)?;
    let stopper = match stopwords {
        None => None,
        Some(path) => {
            if reg.with_stopwords.is_none() {
                return Err(Error::processor(&name, "does not accept a stopword list"));
            }
            let stopper = Stopper::from_file(path)
                .map_err(|e| Error::processor(&name, format!("reading {}: {e}", path.display())))?;
            Some(stopper)
        }
    };
    let resolved = construct(name, reg, stopper)?;
    tracing::debug!(processor = resolved.name(), external_stopwords = resolved.spec.stopwords.is_some(), "resolved processor");
    Ok(resolved)
}

/// Rebuilds a processor from a spec recorded in index metadata.
pub fn resolve_spec(spec: &ProcessorSpec) -> Result<ResolvedProcessor> {
    let name = canonical(Some(spec.name.as_str()));
    let reg = lookup(&name)?;
    construct(name, reg, spec.stopwords.as_ref().map(Stopper::from_words))
}
