use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::analysis::{resolve_processor, resolve_spec, ProcessorSpec, ResolvedProcessor, Token};
use crate::config::FieldSpec;
use crate::error::Result;

/// Routes each field's text to its override processor, or to the default
/// when the field has none. Built once and never changed afterwards.
#[derive(Debug, Clone)]
pub struct PerFieldProcessor {
    default: ResolvedProcessor,
    fields: HashMap<String, ResolvedProcessor>,
}

impl PerFieldProcessor {
    pub fn new(default: ResolvedProcessor, fields: HashMap<String, ResolvedProcessor>) -> Self {
        Self { default, fields }
    }

    /// Resolves the default processor, then one override per field that names
    /// an analyzer or its own stop list.
    pub fn resolve(
        default_name: Option<&str>,
        default_stopwords: Option<&Path>,
        fields: &[FieldSpec],
    ) -> Result<Self> {
        let default = resolve_processor(default_name, default_stopwords)?;
        let mut overrides = HashMap::new();
        for field in fields.iter().filter(|f| f.has_override()) {
            let resolved = resolve_processor(field.analyzer.as_deref(), field.stopwords.as_deref())?;
            tracing::debug!(field = %field.name, processor = resolved.name(), "field override");
            overrides.insert(field.name.clone(), resolved);
        }
        Ok(Self::new(default, overrides))
    }

    /// Rebuilds from the specs recorded in index metadata.
    pub fn from_specs(default: &ProcessorSpec, fields: &BTreeMap<String, ProcessorSpec>) -> Result<Self> {
        let default = resolve_spec(default)?;
        let mut overrides = HashMap::with_capacity(fields.len());
        for (name, spec) in fields {
            overrides.insert(name.clone(), resolve_spec(spec)?);
        }
        Ok(Self::new(default, overrides))
    }

    pub fn default_processor(&self) -> &ResolvedProcessor { &self.default }

    pub fn for_field(&self, field: &str) -> &ResolvedProcessor {
        self.fields.get(field).unwrap_or(&self.default)
    }

    pub fn tokens(&self, field: &str, text: &str) -> Vec<Token> {
        self.for_field(field).tokens(text)
    }

    pub fn field_specs(&self) -> BTreeMap<String, ProcessorSpec> {
        self.fields.iter().map(|(k, v)| (k.clone(), v.spec.clone())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str, analyzer: Option<&str>) -> FieldSpec {
        FieldSpec { analyzer: analyzer.map(String::from), ..FieldSpec::named(name) }
    }

    #[test]
    fn dispatches_by_field_with_fallback() {
        let fields = vec![field("title", Some("keyword")), field("text", None)];
        let p = PerFieldProcessor::resolve(Some("english"), None, &fields).unwrap();
        assert_eq!(p.for_field("title").name(), "keyword");
        assert_eq!(p.for_field("text").name(), "english");
        assert_eq!(p.for_field("unlisted").name(), "english");
        let toks = p.tokens("title", "The Running Man");
        assert_eq!(toks.len(), 1);
        assert_eq!(toks[0].term, "The Running Man");
    }

    #[test]
    fn field_override_failure_propagates() {
        let fields = vec![field("title", Some("nope"))];
        assert!(PerFieldProcessor::resolve(None, None, &fields).is_err());
    }

    #[test]
    fn rebuilds_from_specs() {
        let fields = vec![field("title", Some("simple"))];
        let p = PerFieldProcessor::resolve(None, None, &fields).unwrap();
        let q = PerFieldProcessor::from_specs(&p.default_processor().spec, &p.field_specs()).unwrap();
        assert_eq!(q.for_field("title").name(), "simple");
        assert_eq!(q.default_processor().name(), "standard");
    }
}
