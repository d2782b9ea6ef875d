//! Typed query AST and its Elasticsearch wire format
//!
//! Every clause the builders produce is one of these variants; `to_json` is the only
//! place that knows how the engine spells them.

use super::options::{Scalar, SortOrder};
use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value};

/// Term combination inside a single `match` clause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Operator {
    #[default]
    Or,
    And,
}

impl Operator {
    fn as_str(self) -> &'static str {
        match self {
            Operator::Or => "or",
            Operator::And => "and",
        }
    }
}

/// `match` against one field
#[derive(Debug, Clone, PartialEq)]
pub struct MatchClause {
    pub field: String,
    pub query: String,
    pub boost: f64,
    /// 0 means exact term matching; the key is omitted from the wire format
    pub fuzziness: u8,
    pub prefix_length: u32,
    pub operator: Operator,
}

impl MatchClause {
    pub fn new(field: impl Into<String>, query: impl Into<String>, boost: f64) -> Self {
        Self {
            field: field.into(),
            query: query.into(),
            boost,
            fuzziness: 0,
            prefix_length: 0,
            operator: Operator::Or,
        }
    }

    pub fn fuzzy(mut self, fuzziness: u8, prefix_length: u32) -> Self {
        self.fuzziness = fuzziness;
        self.prefix_length = prefix_length;
        self
    }

    pub fn operator(mut self, operator: Operator) -> Self {
        self.operator = operator;
        self
    }
}

/// `match_phrase` against one field
#[derive(Debug, Clone, PartialEq)]
pub struct PhraseClause {
    pub field: String,
    pub query: String,
    pub slop: u32,
    pub boost: f64,
}

/// Boolean composition
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BoolQuery {
    pub must: Vec<Query>,
    pub should: Vec<Query>,
    pub filter: Vec<Query>,
    pub must_not: Vec<Query>,
    pub minimum_should_match: Option<u32>,
}

impl BoolQuery {
    pub fn is_empty(&self) -> bool {
        self.must.is_empty()
            && self.should.is_empty()
            && self.filter.is_empty()
            && self.must_not.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    MatchAll,
    Match(MatchClause),
    Phrase(PhraseClause),
    Term { field: String, value: Scalar },
    Terms { field: String, values: Vec<Scalar> },
    Bool(BoolQuery),
    /// Drops hits scoring below `min_score`; the inner score is passed through unchanged
    FunctionScore { query: Box<Query>, min_score: f64 },
    /// Sparse-vector expansion against a model-populated companion field
    TextExpansion {
        field: String,
        model_id: String,
        text: String,
        boost: f64,
    },
    /// Provider-specific clause passed through verbatim
    Raw(Value),
}

impl Query {
    pub fn ids_excluded(ids: &[String]) -> Query {
        Query::Terms {
            field: "_id".to_string(),
            values: ids.iter().map(|id| Scalar::Text(id.clone())).collect(),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Query::MatchAll => json!({ "match_all": {} }),
            Query::Match(m) => {
                let mut body = Map::new();
                body.insert("query".into(), Value::String(m.query.clone()));
                body.insert("boost".into(), boost_value(m.boost));
                if m.operator == Operator::And {
                    body.insert("operator".into(), Value::String(m.operator.as_str().into()));
                }
                if m.fuzziness > 0 {
                    body.insert("fuzziness".into(), Value::from(m.fuzziness));
                    body.insert("prefix_length".into(), Value::from(m.prefix_length));
                }
                json!({ "match": { m.field.clone(): body } })
            }
            Query::Phrase(p) => json!({
                "match_phrase": {
                    p.field.clone(): {
                        "query": p.query,
                        "slop": p.slop,
                        "boost": boost_value(p.boost),
                    }
                }
            }),
            Query::Term { field, value } => json!({ "term": { field.clone(): value.to_json() } }),
            Query::Terms { field, values } => json!({
                "terms": { field.clone(): values.iter().map(Scalar::to_json).collect::<Vec<_>>() }
            }),
            Query::Bool(b) => {
                let mut body = Map::new();
                let mut put = |key: &str, clauses: &[Query]| {
                    if !clauses.is_empty() {
                        body.insert(
                            key.to_string(),
                            Value::Array(clauses.iter().map(Query::to_json).collect()),
                        );
                    }
                };
                put("must", &b.must);
                put("filter", &b.filter);
                put("should", &b.should);
                put("must_not", &b.must_not);
                if let Some(msm) = b.minimum_should_match {
                    body.insert("minimum_should_match".into(), Value::from(msm));
                }
                json!({ "bool": body })
            }
            Query::FunctionScore { query, min_score } => json!({
                "function_score": {
                    "query": query.to_json(),
                    "min_score": min_score,
                }
            }),
            Query::TextExpansion {
                field,
                model_id,
                text,
                boost,
            } => json!({
                "text_expansion": {
                    field.clone(): {
                        "model_id": model_id,
                        "model_text": text,
                        "boost": boost_value(*boost),
                    }
                }
            }),
            Query::Raw(value) => value.clone(),
        }
    }
}

impl Serialize for Query {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// One sort key
#[derive(Debug, Clone, PartialEq)]
pub struct SortClause {
    pub field: String,
    pub order: SortOrder,
}

impl SortClause {
    pub fn new(field: &str, order: SortOrder) -> Self {
        Self {
            field: field.to_string(),
            order,
        }
    }

    pub fn to_json(&self) -> Value {
        json!({ self.field.clone(): { "order": self.order.as_str() } })
    }
}

/// Boosts are derived by subtraction, so trim float noise (1.2999999 -> 1.3)
fn boost_value(boost: f64) -> Value {
    Value::from((boost * 100.0).round() / 100.0)
}
