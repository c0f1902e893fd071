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

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tf_provider::schema::{AttributeConstraint, AttributeType};
use tf_provider::value::{Value, ValueList, ValueString};
use tf_provider::schema::{Block, Description, Schema};
use tf_provider::{map, AttributePath, Diagnostics};

use crate::utils::{
    attribute, check_length, known_str, owned_string, unknown_if_null, StringList, WithNormalize,
    WithSchema, WithValidate,
};

const MAX_SCOPES: usize = 100;

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeState<'a> {
    #[serde(borrow = "'a")]
    pub scope_name: ValueString<'a>,
    #[serde(borrow = "'a")]
    pub scope_description: ValueString<'a>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceServerState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    #[serde(borrow = "'a")]
    pub user_pool_id: ValueString<'a>,
    #[serde(borrow = "'a")]
    pub identifier: ValueString<'a>,
    #[serde(borrow = "'a")]
    pub name: ValueString<'a>,
    #[serde(borrow = "'a")]
    pub scope: ValueList<Value<ScopeState<'a>>>,
    #[serde(borrow = "'a")]
    pub scope_identifiers: StringList<'a>,
}

impl<'a> ResourceServerState<'a> {
    /// Known `(name, description)` pairs of the configured scopes.
    pub(super) fn scopes(&self) -> Vec<(&str, &str)> {
        match &self.scope {
            Value::Value(scopes) => scopes
                .iter()
                .filter_map(|scope| match scope {
                    Value::Value(scope) => Some((
                        known_str(&scope.scope_name)?,
                        known_str(&scope.scope_description)?,
                    )),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// `<identifier>/<scope_name>` for each scope, unknown until every part is known.
    pub(super) fn compute_scope_identifiers(&self) -> StringList<'a> {
        let Some(identifier) = known_str(&self.identifier) else {
            return Value::Unknown;
        };
        let scopes = match &self.scope {
            Value::Value(scopes) => scopes,
            Value::Null => return Value::Value(Vec::new()),
            Value::Unknown => return Value::Unknown,
        };
        let mut identifiers = Vec::with_capacity(scopes.len());
        for scope in scopes {
            let Value::Value(scope) = scope else {
                return Value::Unknown;
            };
            let Some(name) = known_str(&scope.scope_name) else {
                return Value::Unknown;
            };
            identifiers.push(owned_string(Some(&format!("{identifier}/{name}"))));
        }
        Value::Value(identifiers)
    }
}

impl<'a> WithSchema for ResourceServerState<'a> {
    fn schema() -> Schema {
        use AttributeConstraint::{Computed, Optional, Required};
        let scope_type = AttributeType::Object(HashMap::from([
            ("scope_name".to_owned(), AttributeType::String),
            ("scope_description".to_owned(), AttributeType::String),
        ]));
        Schema {
            version: 1,
            block: Block {
                description: Description::plain("OAuth 2.0 resource server of a user pool"),
                attributes: map! {
                    "id" => attribute(AttributeType::String, Computed, "`<user_pool_id>|<identifier>`"),
                    "user_pool_id" => attribute(AttributeType::String, Required, "Id of the user pool"),
                    "identifier" => attribute(AttributeType::String, Required, "Unique identifier, usually an URL"),
                    "name" => attribute(AttributeType::String, Required, "Name of the resource server"),
                    "scope" => attribute(
                        AttributeType::List(Box::new(scope_type)),
                        Optional,
                        "Scopes exposed by the resource server",
                    ),
                    "scope_identifiers" => attribute(
                        AttributeType::List(Box::new(AttributeType::String)),
                        Computed,
                        "Fully qualified scope names, as used in `allowed_oauth_scopes`",
                    ),
                },
                ..Default::default()
            },
        }
    }
}

impl<'a> WithNormalize for ResourceServerState<'a> {
    fn normalize(&mut self, _diags: &mut Diagnostics) {
        unknown_if_null(&mut self.id);
        self.scope_identifiers = self.compute_scope_identifiers();
    }
}

#[async_trait]
impl<'a> WithValidate for ResourceServerState<'a> {
    async fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        check_length(
            diags,
            attr_path.clone().attribute("identifier"),
            &self.identifier,
            1,
            256,
        );
        check_length(diags, attr_path.clone().attribute("name"), &self.name, 1, 256);

        let Value::Value(scopes) = &self.scope else {
            return;
        };
        if scopes.len() > MAX_SCOPES {
            diags.error(
                "Too many scopes",
                format!("At most {MAX_SCOPES} scopes are allowed, got {}.", scopes.len()),
                attr_path.clone().attribute("scope"),
            );
        }

        let mut seen = BTreeSet::new();
        for (i, scope) in scopes.iter().enumerate() {
            let Value::Value(scope) = scope else {
                continue;
            };
            let path = attr_path.clone().attribute("scope").index(i as i64);
            check_length(
                diags,
                path.clone().attribute("scope_name"),
                &scope.scope_name,
                1,
                256,
            );
            check_length(
                diags,
                path.clone().attribute("scope_description"),
                &scope.scope_description,
                1,
                256,
            );
            if let Some(name) = known_str(&scope.scope_name) {
                if name.contains(char::is_whitespace) {
                    diags.error_short(
                        "Scope names cannot contain whitespace",
                        path.clone().attribute("scope_name"),
                    );
                }
                if !seen.insert(name) {
                    diags.error(
                        "Duplicate scope",
                        format!("The scope `{name}` is declared more than once."),
                        path.attribute("scope_name"),
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use super::*;

    fn scope<'a>(name: &'a str, description: &'a str) -> Value<ScopeState<'a>> {
        Value::Value(ScopeState {
            scope_name: Value::Value(Cow::Borrowed(name)),
            scope_description: Value::Value(Cow::Borrowed(description)),
        })
    }

    fn server<'a>(scopes: Vec<Value<ScopeState<'a>>>) -> ResourceServerState<'a> {
        ResourceServerState {
            user_pool_id: Value::Value(Cow::Borrowed("us-east-1_abc")),
            identifier: Value::Value(Cow::Borrowed("https://api.example.com")),
            name: Value::Value(Cow::Borrowed("api")),
            scope: Value::Value(scopes),
            ..Default::default()
        }
    }

    #[test]
    fn scope_identifiers_are_qualified() {
        let state = server(vec![scope("read", "Read"), scope("write", "Write")]);
        assert_eq!(
            state.compute_scope_identifiers(),
            Value::Value(vec![
                Value::Value(Cow::Owned("https://api.example.com/read".to_owned())),
                Value::Value(Cow::Owned("https://api.example.com/write".to_owned())),
            ])
        );
    }

    #[test]
    fn scope_identifiers_unknown_until_names_are_known() {
        let mut state = server(vec![scope("read", "Read")]);
        state.scope = Value::Value(vec![Value::Value(ScopeState {
            scope_name: Value::Unknown,
            scope_description: Value::Null,
        })]);
        assert!(state.compute_scope_identifiers().is_unknown());

        state.identifier = Value::Unknown;
        assert!(state.compute_scope_identifiers().is_unknown());
    }

    #[tokio::test]
    async fn duplicate_and_blank_scopes_are_rejected() {
        let state = server(vec![
            scope("read", "Read"),
            scope("read", "Read again"),
            scope("read all", "Everything"),
        ]);
        let mut diags = Diagnostics::default();

        state.validate(&mut diags, Default::default()).await;

        assert_eq!(diags.errors.len(), 2);
    }

    #[tokio::test]
    async fn valid_server_passes() {
        let state = server(vec![scope("read", "Read"), scope("write", "Write")]);
        let mut diags = Diagnostics::default();

        state.validate(&mut diags, Default::default()).await;

        assert!(diags.errors.is_empty());
        assert_eq!(state.scopes(), vec![("read", "Read"), ("write", "Write")]);
    }
}
