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

use std::collections::BTreeMap;

use async_trait::async_trait;
use tf_provider::value::Value;
use tf_provider::{AttributePath, Diagnostics};

use crate::attributes::{AttributeKey, StandardAttribute};
use crate::utils::{check_length, check_one_of, known_str, WithValidate};

use super::state::UserState;

const MESSAGE_ACTIONS: &[&str] = &["RESEND", "SUPPRESS"];
const DELIVERY_MEDIUMS: &[&str] = &["SMS", "EMAIL"];

/// Longest custom attribute name accepted by a user pool schema.
const CUSTOM_NAME_MAX: usize = 20;

#[async_trait]
impl<'a> WithValidate for UserState<'a> {
    async fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        check_length(
            diags,
            attr_path.clone().attribute("user_pool_id"),
            &self.user_pool_id,
            1,
            55,
        );
        check_length(
            diags,
            attr_path.clone().attribute("username"),
            &self.username,
            1,
            128,
        );
        check_one_of(
            diags,
            attr_path.clone().attribute("message_action"),
            &self.message_action,
            MESSAGE_ACTIONS,
        );

        if let Value::Value(mediums) = &self.desired_delivery_mediums {
            for medium in mediums {
                check_one_of(
                    diags,
                    attr_path.clone().attribute("desired_delivery_mediums"),
                    medium,
                    DELIVERY_MEDIUMS,
                );
            }
        }

        if known_str(&self.password).is_some() && known_str(&self.temporary_password).is_some() {
            diags.error_short(
                "`password` and `temporary_password` are mutually exclusive",
                attr_path.clone().attribute("password"),
            );
        }

        if let Value::Value(attributes) = &self.attributes {
            let mut spelled: BTreeMap<AttributeKey, &str> = BTreeMap::new();
            for name in attributes.keys() {
                let path = attr_path.clone().attribute("attributes").key(name.to_string());
                let key = AttributeKey::parse(name);
                if let Some(first) = spelled.insert(key.clone(), name) {
                    diags.error(
                        "Duplicate user attribute",
                        format!("`{first}` and `{name}` both name the attribute `{key}`"),
                        path.clone(),
                    );
                }
                match key {
                    AttributeKey::Custom(custom) if custom.is_empty() => {
                        diags.error_short("Attribute name must not be empty", path);
                    }
                    AttributeKey::Custom(custom) if custom.chars().count() > CUSTOM_NAME_MAX => {
                        diags.error(
                            "Custom attribute name too long",
                            format!("`{custom}` exceeds {CUSTOM_NAME_MAX} characters"),
                            path,
                        );
                    }
                    AttributeKey::Standard(StandardAttribute::Sub) => {
                        diags.warning(
                            "`sub` cannot be modified",
                            "The `sub` attribute is assigned by the service; the configured value is never sent.",
                            path,
                        );
                    }
                    _ => (),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use super::*;

    fn with_attributes(names: &[&'static str]) -> UserState<'static> {
        UserState {
            user_pool_id: Value::Value(Cow::Borrowed("us-east-1_abc")),
            username: Value::Value(Cow::Borrowed("alice")),
            attributes: Value::Value(
                names
                    .iter()
                    .map(|name| (Cow::Borrowed(*name), Value::Value(Cow::Borrowed("x"))))
                    .collect::<BTreeMap<_, _>>(),
            ),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn valid_user() {
        let mut diags = Diagnostics::default();
        with_attributes(&["email", "favorite_color", "custom:team"])
            .validate(&mut diags, AttributePath::default())
            .await;
        assert!(diags.errors.is_empty());
        assert!(diags.warnings.is_empty());
    }

    #[tokio::test]
    async fn empty_custom_name_is_rejected() {
        let mut diags = Diagnostics::default();
        with_attributes(&["custom:"])
            .validate(&mut diags, AttributePath::default())
            .await;
        assert_eq!(diags.errors.len(), 1);
    }

    #[tokio::test]
    async fn sub_only_warns() {
        let mut diags = Diagnostics::default();
        with_attributes(&["sub"])
            .validate(&mut diags, AttributePath::default())
            .await;
        assert!(diags.errors.is_empty());
        assert_eq!(diags.warnings.len(), 1);
    }

    #[tokio::test]
    async fn marker_and_bare_name_collide() {
        let mut diags = Diagnostics::default();
        with_attributes(&["team", "custom:team"])
            .validate(&mut diags, AttributePath::default())
            .await;
        assert_eq!(diags.errors.len(), 1);
    }

    #[tokio::test]
    async fn explicit_custom_email_is_distinct() {
        let mut diags = Diagnostics::default();
        with_attributes(&["email", "custom:email"])
            .validate(&mut diags, AttributePath::default())
            .await;
        assert!(diags.errors.is_empty());
    }

    #[tokio::test]
    async fn exclusive_passwords() {
        let mut diags = Diagnostics::default();
        let state = UserState {
            password: Value::Value(Cow::Borrowed("Passw0rd!")),
            temporary_password: Value::Value(Cow::Borrowed("Temp0rary!")),
            ..with_attributes(&[])
        };
        state.validate(&mut diags, AttributePath::default()).await;
        assert_eq!(diags.errors.len(), 1);
    }
}
