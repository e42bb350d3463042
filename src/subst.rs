// Copyright (c) The confgraph authors.
// Licensed under the MIT License.

use crate::value::Value;

use tracing::debug;

/// Substitution variables applied to string scalars before classification.
///
/// Keys are applied longest-first, so a key that is a prefix of another is
/// never chosen over the more specific match. Each key is applied in a single
/// pass over the current string; substitution does not re-scan its own
/// output for the same key.
#[derive(Debug, Clone, Default)]
pub struct VarSubst {
    // (key, replacement), sorted by descending key length, ties
    // lexicographic for determinism.
    vars: Vec<(String, String)>,
}

impl VarSubst {
    pub fn new(vars: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut vars: Vec<(String, String)> = vars.into_iter().collect();
        vars.sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        Self { vars }
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Replace every occurrence of every variable key in `s`.
    pub fn apply_str(&self, s: &str) -> String {
        let mut updated = s.to_string();
        for (key, replacement) in &self.vars {
            updated = updated.replace(key.as_str(), replacement);
        }
        updated
    }

    /// Substitute a scalar. Non-string scalars pass through unchanged.
    pub fn apply(&self, v: &Value) -> Value {
        match v {
            Value::String(s) => {
                let updated = self.apply_str(s);
                if updated.as_str() != s.as_ref() {
                    debug!(old = %s, new = %updated, "updating parameter");
                }
                Value::String(updated.into())
            }
            _ => v.clone(),
        }
    }
}
