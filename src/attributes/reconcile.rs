// This file is part of the terraform-provider-cognito project
//
// Copyright (C) ANEO, 2024-2024. All rights reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License")
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::collections::{btree_map, BTreeMap, BTreeSet};

use super::key::AttributeKey;

/// Set of user attributes keyed by normalized name.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AttributeSet(BTreeMap<AttributeKey, String>);

impl AttributeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: AttributeKey, value: impl Into<String>) -> Option<String> {
        self.0.insert(key, value.into())
    }

    pub fn get(&self, key: &AttributeKey) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, AttributeKey, String> {
        self.0.iter()
    }

    /// Pairs with the `custom:` marker applied, as sent to the service.
    pub fn wire_pairs(&self) -> impl Iterator<Item = (String, String)> + '_ {
        self.0
            .iter()
            .map(|(k, v)| (k.wire_name().into_owned(), v.clone()))
    }

    fn without_immutable(&self) -> impl Iterator<Item = (&AttributeKey, &String)> + '_ {
        self.0.iter().filter(|(k, _)| !k.is_immutable())
    }
}

impl<K, V> FromIterator<(K, V)> for AttributeSet
where
    K: AsRef<str>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (AttributeKey::parse(k.as_ref()), v.into()))
                .collect(),
        )
    }
}

impl IntoIterator for AttributeSet {
    type Item = (AttributeKey, String);
    type IntoIter = btree_map::IntoIter<AttributeKey, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Calls needed to converge the remote attributes onto the desired ones.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconciliationPlan {
    pub upserts: AttributeSet,
    pub deletions: BTreeSet<AttributeKey>,
}

impl ReconciliationPlan {
    pub fn is_empty(&self) -> bool {
        self.upserts.is_empty() && self.deletions.is_empty()
    }

    pub fn deletion_wire_names(&self) -> impl Iterator<Item = String> + '_ {
        self.deletions.iter().map(|k| k.wire_name().into_owned())
    }
}

/// Compute the upserts and deletions turning `old` into `new`.
///
/// Immutable attributes (`sub`) are ignored on both sides.
pub fn reconcile(old: &AttributeSet, new: &AttributeSet) -> ReconciliationPlan {
    let mut plan = ReconciliationPlan::default();
    let mut seen = BTreeSet::new();

    for (key, value) in new.without_immutable() {
        if old.get(key) != Some(value.as_str()) {
            plan.upserts.insert(key.clone(), value.clone());
        }
        seen.insert(key);
    }

    for (key, _) in old.without_immutable() {
        if !seen.contains(key) {
            plan.deletions.insert(key.clone());
        }
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(pairs: &[(&str, &str)]) -> AttributeSet {
        pairs.iter().copied().collect()
    }

    fn assert_plan_invariants(old: &AttributeSet, new: &AttributeSet) {
        let plan = reconcile(old, new);

        for (key, _) in plan.upserts.iter() {
            assert!(!plan.deletions.contains(key), "{key} both upserted and deleted");
        }
        for (key, value) in new.iter().filter(|(k, _)| !k.is_immutable()) {
            if old.get(key) != Some(value.as_str()) {
                assert_eq!(plan.upserts.get(key), Some(value.as_str()));
            } else {
                assert!(plan.upserts.get(key).is_none());
            }
        }
        for (key, _) in old.iter().filter(|(k, _)| !k.is_immutable()) {
            if new.get(key).is_none() {
                assert!(plan.deletions.contains(key));
            }
        }
        assert!(plan.upserts.iter().all(|(k, _)| !k.is_immutable()));
        assert!(plan.deletions.iter().all(|k| !k.is_immutable()));
    }

    #[test]
    fn changed_standard_and_new_custom() {
        let old = set(&[("email", "a@x.com"), ("sub", "abc")]);
        let new = set(&[("email", "b@x.com"), ("nickname", "Bob")]);

        let plan = reconcile(&old, &new);

        assert_eq!(
            plan.upserts.wire_pairs().collect::<Vec<_>>(),
            vec![
                ("email".to_string(), "b@x.com".to_string()),
                ("custom:nickname".to_string(), "Bob".to_string()),
            ]
        );
        assert!(plan.deletions.is_empty());
    }

    #[test]
    fn removed_custom_is_deleted() {
        let old = set(&[("custom:color", "red")]);
        let new = set(&[]);

        let plan = reconcile(&old, &new);

        assert!(plan.upserts.is_empty());
        assert_eq!(
            plan.deletion_wire_names().collect::<Vec<_>>(),
            vec!["custom:color".to_string()]
        );
    }

    #[test]
    fn prefixed_and_bare_custom_keys_compare_equal() {
        let old = set(&[("custom:color", "red")]);
        let new = set(&[("color", "red")]);

        assert!(reconcile(&old, &new).is_empty());
    }

    #[test]
    fn reconcile_with_itself_is_empty() {
        let old = set(&[
            ("email", "a@x.com"),
            ("sub", "abc"),
            ("custom:team", "blue"),
            ("given_name", "Ann"),
        ]);

        assert_eq!(reconcile(&old, &old), ReconciliationPlan::default());
    }

    #[test]
    fn sub_is_never_emitted() {
        let plan = reconcile(&set(&[("sub", "abc")]), &set(&[]));
        assert!(plan.is_empty());

        let plan = reconcile(&set(&[]), &set(&[("sub", "abc")]));
        assert!(plan.is_empty());

        let plan = reconcile(&set(&[("sub", "abc")]), &set(&[("sub", "def")]));
        assert!(plan.is_empty());
    }

    #[test]
    fn invariants_hold_on_mixed_inputs() {
        let cases = [
            (set(&[]), set(&[])),
            (set(&[("email", "a")]), set(&[])),
            (set(&[]), set(&[("email", "a"), ("team", "x")])),
            (
                set(&[("email", "a"), ("custom:team", "x"), ("locale", "fr")]),
                set(&[("email", "b"), ("team", "x"), ("zoneinfo", "UTC")]),
            ),
            (
                set(&[("sub", "1"), ("phone_number", "+33")]),
                set(&[("sub", "2"), ("phone_number", "+33"), ("custom:sub", "3")]),
            ),
        ];

        for (old, new) in &cases {
            assert_plan_invariants(old, new);
            assert_plan_invariants(new, old);
        }
    }
}
