//! # URDNA2015 Canonicalization
//!
//! Expands a JSON-LD document (via the document loader from C3), converts
//! its RDF quads into an [`oxrdf::Dataset`], and canonicalizes that dataset
//! with `rdf-canon`'s SHA-256-backed URDNA2015 implementation, producing the
//! canonical N-Quads text that C5 hashes.

use iref::{Iri, IriBuf};
use json_ld::rdf::RdfDirection;
use json_ld::{JsonLdProcessor, RdfQuads, RemoteDocument, RemoteDocumentReference};
use oxrdf::{BlankNode, Dataset, GraphName, Literal, NamedNode, Quad, Subject, Term};
use rdf_types::generator;

use crate::error::{Result, TrustError};
use crate::loader::TrustDocumentLoader;

fn to_unexpected<E: std::fmt::Display>(context: &str, err: E) -> TrustError {
    TrustError::Unexpected(anyhow::anyhow!("{context}: {err}"))
}

/// Expands `document` against `base_iri` using `loader` and returns its
/// URDNA2015-canonical N-Quads serialization.
pub async fn canonicalize(
    document: &json_syntax::Value, base_iri: &Iri, loader: &TrustDocumentLoader,
) -> Result<String> {
    let remote = RemoteDocument::new(Some(base_iri.to_owned()), None, document.clone());
    let expanded = RemoteDocumentReference::Loaded(remote)
        .expand(loader)
        .await
        .map_err(|e| to_unexpected("JSON-LD expansion failed", e))?;

    let mut generator = generator::Blank::new_with_prefix("b".to_string());
    let dataset: Dataset = expanded
        .rdf_quads(&mut generator, Some(RdfDirection::I18nDatatype))
        .map(quad_to_oxrdf)
        .collect::<Result<Dataset>>()?;

    rdf_canon::canonicalize(&dataset).map_err(|e| to_unexpected("URDNA2015 canonicalization failed", e))
}

type JsonLdQuadRef<'a> = json_ld::rdf::QuadRef<'a, IriBuf, rdf_types::BlankIdBuf, rdf_types::Literal>;

fn quad_to_oxrdf(quad: JsonLdQuadRef<'_>) -> Result<Quad> {
    let rdf_types::Quad(subject, predicate, object, graph) = quad;

    let subject = valid_id_to_subject(&subject)?;
    let predicate = match &*predicate {
        rdf_types::Id::Iri(iri) => named_node(iri),
        rdf_types::Id::Blank(_) => {
            return Err(TrustError::VerificationFailed("generalized RDF (blank-node predicate) is not supported".into()));
        }
    };
    let object = value_to_term(&object)?;
    let graph_name = match graph {
        Some(g) => valid_id_to_graph_name(g),
        None => GraphName::DefaultGraph,
    };

    Ok(Quad::new(subject, predicate, object, graph_name))
}

fn named_node(iri: &IriBuf) -> NamedNode {
    NamedNode::new_unchecked(iri.as_str())
}

fn blank_node(id: &rdf_types::BlankIdBuf) -> BlankNode {
    BlankNode::new_unchecked(id.suffix())
}

fn valid_id_to_subject(id: &rdf_types::Id<IriBuf, rdf_types::BlankIdBuf>) -> Result<Subject> {
    Ok(match id {
        rdf_types::Id::Iri(iri) => Subject::NamedNode(named_node(iri)),
        rdf_types::Id::Blank(b) => Subject::BlankNode(blank_node(b)),
    })
}

fn valid_id_to_graph_name(id: &rdf_types::Id<IriBuf, rdf_types::BlankIdBuf>) -> GraphName {
    match id {
        rdf_types::Id::Iri(iri) => GraphName::NamedNode(named_node(iri)),
        rdf_types::Id::Blank(b) => GraphName::BlankNode(blank_node(b)),
    }
}

fn value_to_term(value: &rdf_types::Object<rdf_types::Id<IriBuf, rdf_types::BlankIdBuf>, rdf_types::Literal>) -> Result<Term> {
    Ok(match value {
        rdf_types::Term::Id(rdf_types::Id::Iri(iri)) => Term::NamedNode(named_node(iri)),
        rdf_types::Term::Id(rdf_types::Id::Blank(b)) => Term::BlankNode(blank_node(b)),
        rdf_types::Term::Literal(lit) => Term::Literal(literal(lit)),
    })
}

fn literal(lit: &rdf_types::Literal) -> Literal {
    match &lit.type_ {
        rdf_types::LiteralType::Any(datatype) => {
            Literal::new_typed_literal(lit.value.clone(), NamedNode::new_unchecked(datatype.as_str()))
        }
        rdf_types::LiteralType::LangString(tag) => Literal::new_language_tagged_literal_unchecked(
            lit.value.clone(),
            tag.as_str().to_ascii_lowercase(),
        ),
    }
}
