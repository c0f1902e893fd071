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

use std::borrow::Cow;
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use async_trait::async_trait;

use tf_provider::schema::{Attribute, AttributeConstraint, AttributeType, Description};
use tf_provider::value::{Value, ValueMap, ValueNumber, ValueString};
use tf_provider::schema::Schema;
use tf_provider::{AttributePath, Diagnostics};

pub(crate) type StringSet<'a> = Value<BTreeSet<ValueString<'a>>>;
pub(crate) type StringList<'a> = Value<Vec<ValueString<'a>>>;
pub(crate) type StringMap<'a> = ValueMap<'a, ValueString<'a>>;

pub(crate) trait WithSchema {
    fn schema() -> Schema;
}

#[async_trait]
pub(crate) trait WithValidate {
    async fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath);
}

pub(crate) trait WithNormalize {
    fn normalize(&mut self, diags: &mut Diagnostics);
}

pub(crate) fn attribute(
    attr_type: AttributeType,
    constraint: AttributeConstraint,
    description: &str,
) -> Attribute {
    Attribute {
        attr_type,
        description: Description::plain(description),
        constraint,
        ..Default::default()
    }
}

pub(crate) fn sensitive_attribute(
    attr_type: AttributeType,
    constraint: AttributeConstraint,
    description: &str,
) -> Attribute {
    Attribute {
        sensitive: true,
        ..attribute(attr_type, constraint, description)
    }
}

pub(crate) fn string_set_type() -> AttributeType {
    AttributeType::Set(Box::new(AttributeType::String))
}

pub(crate) fn string_map_type() -> AttributeType {
    AttributeType::Map(Box::new(AttributeType::String))
}

/// Known string value, `None` when null or unknown.
pub(crate) fn known_str<'a>(value: &'a ValueString<'_>) -> Option<&'a str> {
    match value {
        Value::Value(s) => Some(s.as_ref()),
        _ => None,
    }
}

pub(crate) fn known_bool(value: &Value<bool>) -> Option<bool> {
    match value {
        Value::Value(b) => Some(*b),
        _ => None,
    }
}

pub(crate) fn known_i32(value: &ValueNumber) -> Option<i32> {
    match value {
        Value::Value(n) => i32::try_from(*n).ok(),
        _ => None,
    }
}

pub(crate) fn owned_string<'a>(value: Option<&str>) -> ValueString<'a> {
    match value {
        Some(s) => Value::Value(Cow::Owned(s.to_owned())),
        None => Value::Null,
    }
}

pub(crate) fn owned_number(value: Option<i32>) -> ValueNumber {
    value.map_or(Value::Null, |n| Value::Value(n.into()))
}

/// Flatten a service list into a set; an empty list becomes null.
pub(crate) fn owned_set<'a, I, S>(values: I) -> StringSet<'a>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let set: BTreeSet<_> = values
        .into_iter()
        .map(|s| Value::Value(Cow::Owned(s.as_ref().to_owned())))
        .collect();
    if set.is_empty() {
        Value::Null
    } else {
        Value::Value(set)
    }
}

pub(crate) fn owned_map<'a, I, K, V>(values: I) -> StringMap<'a>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    Value::Value(
        values
            .into_iter()
            .map(|(k, v)| {
                (
                    Cow::Owned(k.as_ref().to_owned()),
                    Value::Value(Cow::Owned(v.as_ref().to_owned())),
                )
            })
            .collect::<BTreeMap<_, _>>(),
    )
}

/// Known elements of a set, `None` when the set itself is null or unknown.
pub(crate) fn known_strings(value: &StringSet<'_>) -> Option<Vec<String>> {
    match value {
        Value::Value(set) => Some(
            set.iter()
                .filter_map(|s| known_str(s).map(str::to_owned))
                .collect(),
        ),
        _ => None,
    }
}

pub(crate) fn known_list(value: &StringList<'_>) -> Option<Vec<String>> {
    match value {
        Value::Value(list) => Some(
            list.iter()
                .filter_map(|s| known_str(s).map(str::to_owned))
                .collect(),
        ),
        _ => None,
    }
}

pub(crate) fn known_map(value: &StringMap<'_>) -> Option<HashMap<String, String>> {
    match value {
        Value::Value(map) => Some(
            map.iter()
                .filter_map(|(k, v)| Some((k.to_string(), known_str(v)?.to_owned())))
                .collect(),
        ),
        _ => None,
    }
}

/// Copy `planned` into `current` when it is known and differs.
///
/// Returns whether `current` was changed.
pub(crate) fn take_planned<T: PartialEq + Clone>(current: &mut Value<T>, planned: &Value<T>) -> bool {
    if planned.is_unknown() || current == planned {
        return false;
    }
    *current = planned.clone();
    true
}

/// Mark a computed attribute unknown when the configuration left it null.
pub(crate) fn unknown_if_null<T>(value: &mut Value<T>) {
    if value.is_null() {
        *value = Value::Unknown;
    }
}

/// Split an import id made of exactly `N` non-empty parts.
pub(crate) fn split_id<const N: usize>(id: &str, sep: char) -> Option<[&str; N]> {
    let mut parts = [""; N];
    let mut iter = id.split(sep);
    for part in parts.iter_mut() {
        *part = iter.next().filter(|p| !p.is_empty())?;
    }
    match iter.next() {
        Some(_) => None,
        None => Some(parts),
    }
}

pub(crate) fn check_length(
    diags: &mut Diagnostics,
    attr_path: AttributePath,
    value: &ValueString<'_>,
    min: usize,
    max: usize,
) {
    if let Some(s) = known_str(value) {
        let len = s.chars().count();
        if len < min || len > max {
            diags.error(
                "Invalid length",
                format!("The value must be between {min} and {max} characters long, but has {len}."),
                attr_path,
            );
        }
    }
}

pub(crate) fn check_one_of(
    diags: &mut Diagnostics,
    attr_path: AttributePath,
    value: &ValueString<'_>,
    allowed: &[&str],
) {
    if let Some(s) = known_str(value) {
        if !allowed.contains(&s) {
            diags.error(
                "Invalid value",
                format!(
                    "`{s}` is not one of: {}",
                    allowed.iter().join_with(", ")
                ),
                attr_path,
            );
        }
    }
}

pub(crate) fn check_set_size(
    diags: &mut Diagnostics,
    attr_path: AttributePath,
    value: &StringSet<'_>,
    max: usize,
) {
    if let Value::Value(set) = value {
        if set.len() > max {
            diags.error(
                "Too many elements",
                format!("At most {max} elements are allowed, got {}.", set.len()),
                attr_path,
            );
        }
    }
}

pub struct DisplayJoiner<'a, T, I>
where
    T: Iterator<Item = I>,
    I: std::fmt::Display,
{
    iter: RefCell<T>,
    sep: &'a str,
}

pub trait DisplayJoinable {
    type Joiner<'a>;
    fn join_with(self, sep: &str) -> Self::Joiner<'_>;
}

impl<T, I> DisplayJoinable for T
where
    T: Iterator<Item = I>,
    I: std::fmt::Display,
{
    type Joiner<'a> = DisplayJoiner<'a, T, I>;

    fn join_with(self, sep: &str) -> Self::Joiner<'_> {
        DisplayJoiner {
            iter: RefCell::new(self),
            sep,
        }
    }
}

impl<'a, T, I> std::fmt::Display for DisplayJoiner<'a, T, I>
where
    T: Iterator<Item = I>,
    I: std::fmt::Display,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut sep = "";
        let mut iter = self.iter.try_borrow_mut().or(Err(std::fmt::Error))?;
        for elt in iter.by_ref() {
            f.write_str(sep)?;
            f.write_fmt(format_args!("{elt}"))?;
            sep = self.sep;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_with_separator() {
        let joined = ["a", "b", "c"].iter().join_with(", ").to_string();
        assert_eq!(joined, "a, b, c");
        let empty = std::iter::empty::<&str>().join_with(", ").to_string();
        assert_eq!(empty, "");
    }

    #[test]
    fn split_id_exact_parts() {
        assert_eq!(
            split_id::<2>("us-east-1_abc/alice", '/'),
            Some(["us-east-1_abc", "alice"])
        );
        assert_eq!(split_id::<2>("us-east-1_abc", '/'), None);
        assert_eq!(split_id::<2>("a/b/c", '/'), None);
        assert_eq!(split_id::<2>("a/", '/'), None);
    }

    #[test]
    fn take_planned_ignores_unknown_and_equal() {
        let mut current: ValueNumber = Value::Value(60);

        assert!(!take_planned(&mut current, &Value::Unknown));
        assert!(!take_planned(&mut current, &Value::Value(60)));
        assert_eq!(current, Value::Value(60));

        assert!(take_planned(&mut current, &Value::Value(30)));
        assert_eq!(current, Value::Value(30));

        assert!(take_planned(&mut current, &Value::Null));
        assert!(current.is_null());
    }

    #[test]
    fn empty_set_flattens_to_null() {
        assert!(owned_set(Vec::<String>::new()).is_null());
        let set = owned_set(["b", "a"]);
        assert_eq!(known_strings(&set), Some(vec!["a".to_owned(), "b".to_owned()]));
    }

    #[test]
    fn check_one_of_reports_error() {
        let mut diags = Diagnostics::default();
        check_one_of(
            &mut diags,
            AttributePath::new("message_action"),
            &Value::Value(Cow::Borrowed("LOUD")),
            &["RESEND", "SUPPRESS"],
        );
        assert_eq!(diags.errors.len(), 1);

        let mut diags = Diagnostics::default();
        check_one_of(
            &mut diags,
            AttributePath::new("message_action"),
            &Value::Unknown,
            &["RESEND", "SUPPRESS"],
        );
        assert!(diags.errors.is_empty());
    }
}
