//! Posterior draw storage keyed by typed parameter names.

use std::fmt::{self, Display};
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::errors::{ErrorInfo, PosteriorError};

fn invalid(code: &str, message: impl Into<String>) -> ErrorInfo {
    ErrorInfo::new(code, message)
}

/// Typed parameter address: a base name plus an index tuple.
///
/// Indices are 1-based as the sampling engine writes them, so `L_u[1,2]` is
/// the element in the first row and second column of `L_u`. Scalars carry an
/// empty index tuple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParamKey {
    base: String,
    index: Vec<usize>,
}

impl ParamKey {
    /// Creates a key for a scalar parameter.
    pub fn scalar(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            index: Vec::new(),
        }
    }

    /// Creates a key for one element of a vector or matrix parameter.
    pub fn indexed(base: impl Into<String>, index: &[usize]) -> Self {
        Self {
            base: base.into(),
            index: index.to_vec(),
        }
    }

    /// Parses `name`, `name[i,j]` or the dotted `name.i.j` form.
    pub fn parse(text: &str) -> Result<Self, PosteriorError> {
        let text = text.trim();
        if let Some(open) = text.find('[') {
            let Some(inner) = text[open + 1..].strip_suffix(']') else {
                return Err(PosteriorError::InvalidParameter(
                    invalid("malformed-key", "unterminated index bracket")
                        .with_context("key", text),
                ));
            };
            let index = inner
                .split(',')
                .map(|part| parse_index(text, part))
                .collect::<Result<Vec<_>, _>>()?;
            return Self::checked(text, &text[..open], index);
        }

        let mut segments = text.split('.');
        let base = segments.next().unwrap_or_default();
        let rest: Vec<&str> = segments.collect();
        if !rest.is_empty() && rest.iter().all(|part| part.parse::<usize>().is_ok()) {
            let index = rest
                .iter()
                .map(|part| parse_index(text, part))
                .collect::<Result<Vec<_>, _>>()?;
            return Self::checked(text, base, index);
        }
        Self::checked(text, text, Vec::new())
    }

    fn checked(text: &str, base: &str, index: Vec<usize>) -> Result<Self, PosteriorError> {
        let base = base.trim();
        if base.is_empty() {
            return Err(PosteriorError::InvalidParameter(
                invalid("malformed-key", "parameter name is empty").with_context("key", text),
            ));
        }
        Ok(Self {
            base: base.to_string(),
            index,
        })
    }

    /// Base parameter name.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Index tuple (empty for scalars).
    pub fn index(&self) -> &[usize] {
        &self.index
    }

    /// Returns `true` when the key addresses a scalar parameter.
    pub fn is_scalar(&self) -> bool {
        self.index.is_empty()
    }
}

fn parse_index(text: &str, part: &str) -> Result<usize, PosteriorError> {
    match part.trim().parse::<usize>() {
        Ok(value) if value >= 1 => Ok(value),
        _ => Err(PosteriorError::InvalidParameter(
            invalid("malformed-key", "indices must be positive integers")
                .with_context("key", text)
                .with_context("index", part.trim()),
        )),
    }
}

impl Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base)?;
        if !self.index.is_empty() {
            let parts: Vec<String> = self.index.iter().map(|idx| idx.to_string()).collect();
            write!(f, "[{}]", parts.join(","))?;
        }
        Ok(())
    }
}

impl FromStr for ParamKey {
    type Err = PosteriorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Value of a parameter at one iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum DrawValue {
    /// Scalar parameter value.
    Scalar {
        /// The value.
        value: f64,
    },
    /// Vector parameter value.
    Vector {
        /// Elements in index order.
        values: Vec<f64>,
    },
    /// Matrix parameter value stored row-major.
    Matrix {
        /// Number of rows.
        rows: usize,
        /// Number of columns.
        cols: usize,
        /// Row-major elements.
        values: Vec<f64>,
    },
}

impl DrawValue {
    /// Returns the `(row, col)` entry (0-based) of a matrix value.
    pub fn matrix_entry(&self, row: usize, col: usize) -> Option<f64> {
        match self {
            DrawValue::Matrix { rows, cols, values } if row < *rows && col < *cols => {
                values.get(row * cols + col).copied()
            }
            _ => None,
        }
    }
}

/// One realization of a parameter from the posterior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draw {
    /// Position of the draw within the store.
    pub iteration: usize,
    /// Chain label when the store carries chain information.
    pub chain: Option<usize>,
    /// Parameter value at this iteration.
    pub value: DrawValue,
}

/// Ordered posterior draws for every parameter of one sampling run.
///
/// Every sequence has the same length. Optional chain labels assign each
/// draw position to the chain it came from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawStore {
    draw_count: usize,
    chains: Option<Vec<usize>>,
    params: IndexMap<ParamKey, Vec<f64>>,
}

impl DrawStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches per-draw chain labels.
    pub fn with_chains(mut self, labels: Vec<usize>) -> Result<Self, PosteriorError> {
        if !self.params.is_empty() && labels.len() != self.draw_count {
            return Err(PosteriorError::Shape(
                ErrorInfo::new("chain-label-length", "chain labels must cover every draw")
                    .with_context("draws", self.draw_count.to_string())
                    .with_context("labels", labels.len().to_string()),
            ));
        }
        self.draw_count = labels.len();
        self.chains = Some(labels);
        Ok(self)
    }

    /// Adds the draw sequence of one parameter element.
    pub fn insert(&mut self, key: ParamKey, draws: Vec<f64>) -> Result<(), PosteriorError> {
        if self.params.contains_key(&key) {
            return Err(PosteriorError::InvalidParameter(
                invalid("duplicate-parameter", "parameter already present in store")
                    .with_context("parameter", key.to_string()),
            ));
        }
        let constrained = !self.params.is_empty() || self.chains.is_some();
        if constrained && draws.len() != self.draw_count {
            return Err(PosteriorError::Shape(
                ErrorInfo::new("draw-count-mismatch", "draw count must match the store")
                    .with_context("parameter", key.to_string())
                    .with_context("expected", self.draw_count.to_string())
                    .with_context("found", draws.len().to_string()),
            ));
        }
        self.draw_count = draws.len();
        self.params.insert(key, draws);
        Ok(())
    }

    /// Adds a scalar parameter.
    pub fn insert_scalar(
        &mut self,
        name: impl Into<String>,
        draws: Vec<f64>,
    ) -> Result<(), PosteriorError> {
        self.insert(ParamKey::scalar(name), draws)
    }

    /// Number of draws per parameter.
    pub fn draw_count(&self) -> usize {
        self.draw_count
    }

    /// Number of stored parameter elements.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Returns `true` when no parameter has been stored.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Iterates over parameter keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &ParamKey> {
        self.params.keys()
    }

    /// Returns `true` if any element with the given base name exists.
    pub fn contains_base(&self, base: &str) -> bool {
        self.params.keys().any(|key| key.base() == base)
    }

    /// Looks up the draws of `base[index]`.
    pub fn get(&self, base: &str, index: &[usize]) -> Result<&[f64], PosteriorError> {
        if let Some(draws) = self.params.get(&ParamKey::indexed(base, index)) {
            return Ok(draws);
        }
        let key = ParamKey::indexed(base, index).to_string();
        if self.contains_base(base) {
            Err(PosteriorError::InvalidParameter(
                invalid("unknown-index", "index not present for parameter")
                    .with_context("parameter", key),
            ))
        } else {
            Err(PosteriorError::InvalidParameter(
                invalid("unknown-parameter", "parameter not present in store")
                    .with_context("parameter", key)
                    .with_hint("parameter names are case sensitive"),
            ))
        }
    }

    /// Looks up the draws addressed by a parsed key.
    pub fn get_key(&self, key: &ParamKey) -> Result<&[f64], PosteriorError> {
        self.get(key.base(), key.index())
    }

    /// Looks up the draws of a scalar parameter.
    pub fn scalar(&self, name: &str) -> Result<&[f64], PosteriorError> {
        self.get(name, &[])
    }

    /// Extent of each index axis of a parameter (largest index seen per axis).
    pub fn dims(&self, base: &str) -> Result<Vec<usize>, PosteriorError> {
        let mut dims: Option<Vec<usize>> = None;
        for key in self.params.keys().filter(|key| key.base() == base) {
            let current = dims.get_or_insert_with(|| vec![0; key.index().len()]);
            if current.len() != key.index().len() {
                return Err(PosteriorError::Shape(
                    ErrorInfo::new("inconsistent-rank", "elements disagree on index rank")
                        .with_context("parameter", base),
                ));
            }
            for (extent, idx) in current.iter_mut().zip(key.index()) {
                *extent = (*extent).max(*idx);
            }
        }
        dims.ok_or_else(|| {
            PosteriorError::InvalidParameter(
                invalid("unknown-parameter", "parameter not present in store")
                    .with_context("parameter", base),
            )
        })
    }

    /// Reassembles the full value of `base` at one draw position.
    ///
    /// Elements absent from the store read as zero, which matches how
    /// triangular factors are often written.
    pub fn draw(&self, base: &str, iteration: usize) -> Result<Draw, PosteriorError> {
        if iteration >= self.draw_count {
            return Err(PosteriorError::InvalidParameter(
                invalid("iteration-out-of-range", "draw position beyond the store")
                    .with_context("iteration", iteration.to_string())
                    .with_context("draws", self.draw_count.to_string()),
            ));
        }
        let dims = self.dims(base)?;
        let value_at = |index: &[usize]| {
            self.params
                .get(&ParamKey::indexed(base, index))
                .map(|draws| draws[iteration])
                .unwrap_or(0.0)
        };
        let value = match dims.as_slice() {
            [] => DrawValue::Scalar {
                value: value_at(&[]),
            },
            [len] => DrawValue::Vector {
                values: (1..=*len).map(|i| value_at(&[i])).collect(),
            },
            [rows, cols] => {
                let mut values = Vec::with_capacity(rows * cols);
                for r in 1..=*rows {
                    for c in 1..=*cols {
                        values.push(value_at(&[r, c]));
                    }
                }
                DrawValue::Matrix {
                    rows: *rows,
                    cols: *cols,
                    values,
                }
            }
            _ => {
                return Err(PosteriorError::InvalidParameter(
                    invalid("unsupported-rank", "only scalars, vectors and matrices are supported")
                        .with_context("parameter", base)
                        .with_context("rank", dims.len().to_string()),
                ))
            }
        };
        Ok(Draw {
            iteration,
            chain: self.chains.as_ref().map(|labels| labels[iteration]),
            value,
        })
    }

    /// Reads a vector parameter as one `Vec` per draw, e.g. `sigma_u` or `y_rep`.
    pub fn vector_draws(&self, base: &str) -> Result<Vec<Vec<f64>>, PosteriorError> {
        let dims = self.dims(base)?;
        let [len] = dims.as_slice() else {
            return Err(PosteriorError::InvalidParameter(
                invalid("not-a-vector", "parameter is not a vector")
                    .with_context("parameter", base)
                    .with_context("rank", dims.len().to_string()),
            ));
        };
        let columns = (1..=*len)
            .map(|i| self.get(base, &[i]))
            .collect::<Result<Vec<_>, _>>()?;
        Ok((0..self.draw_count)
            .map(|iteration| columns.iter().map(|draws| draws[iteration]).collect())
            .collect())
    }

    /// Per-draw chain labels, if any.
    pub fn chain_labels(&self) -> Option<&[usize]> {
        self.chains.as_deref()
    }

    /// Number of distinct chains (1 when the store is unlabeled).
    pub fn chain_count(&self) -> usize {
        match &self.chains {
            Some(labels) => {
                let mut seen: Vec<usize> = labels.clone();
                seen.sort_unstable();
                seen.dedup();
                seen.len().max(1)
            }
            None => 1,
        }
    }

    /// Splits a draw sequence of this store into one sequence per chain.
    ///
    /// Chains appear in the order of their first draw.
    pub fn split_by_chain(&self, draws: &[f64]) -> Vec<Vec<f64>> {
        let Some(labels) = &self.chains else {
            return vec![draws.to_vec()];
        };
        let mut groups: IndexMap<usize, Vec<f64>> = IndexMap::new();
        for (label, value) in labels.iter().zip(draws) {
            groups.entry(*label).or_default().push(*value);
        }
        groups.into_values().collect()
    }

    /// Concatenates per-chain stores into one labelled store.
    ///
    /// Every store must carry exactly the same parameter keys. The chain
    /// label of each draw is the position of its source store.
    pub fn merge_chains(stores: Vec<DrawStore>) -> Result<DrawStore, PosteriorError> {
        let mut iter = stores.into_iter();
        let Some(first) = iter.next() else {
            return Ok(DrawStore::new());
        };
        let keys: Vec<ParamKey> = first.params.keys().cloned().collect();
        let mut labels = vec![0; first.draw_count];
        let mut params = first.params;
        for (chain, store) in iter.enumerate().map(|(idx, store)| (idx + 1, store)) {
            if store.params.len() != keys.len()
                || keys.iter().any(|key| !store.params.contains_key(key))
            {
                return Err(PosteriorError::Shape(
                    ErrorInfo::new("chain-parameter-mismatch", "chains carry different parameters")
                        .with_context("chain", chain.to_string()),
                ));
            }
            labels.extend(std::iter::repeat(chain).take(store.draw_count));
            for (key, draws) in store.params {
                if let Some(merged) = params.get_mut(&key) {
                    merged.extend(draws);
                }
            }
        }
        let draw_count = labels.len();
        Ok(DrawStore {
            draw_count,
            chains: Some(labels),
            params,
        })
    }
}
