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

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tf_provider::schema::{AttributeConstraint, AttributeType};
use tf_provider::value::{Value, ValueString};
use tf_provider::schema::{Block, Description, Schema};
use tf_provider::{map, AttributePath, Diagnostics};

use crate::utils::{
    attribute, check_length, check_one_of, string_map_type, unknown_if_null, StringList,
    StringMap, WithNormalize, WithSchema, WithValidate,
};

pub(super) const PROVIDER_TYPES: &[&str] = &[
    "SAML",
    "Facebook",
    "Google",
    "LoginWithAmazon",
    "SignInWithApple",
    "OIDC",
];

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityProviderState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    #[serde(borrow = "'a")]
    pub user_pool_id: ValueString<'a>,
    #[serde(borrow = "'a")]
    pub provider_name: ValueString<'a>,
    #[serde(borrow = "'a")]
    pub provider_type: ValueString<'a>,
    #[serde(borrow = "'a")]
    pub provider_details: StringMap<'a>,
    #[serde(borrow = "'a")]
    pub attribute_mapping: StringMap<'a>,
    #[serde(borrow = "'a")]
    pub idp_identifiers: StringList<'a>,
}

impl<'a> WithSchema for IdentityProviderState<'a> {
    fn schema() -> Schema {
        use AttributeConstraint::{Computed, Optional, OptionalComputed, Required};
        Schema {
            version: 1,
            block: Block {
                description: Description::plain("Federated identity provider of a user pool"),
                attributes: map! {
                    "id" => attribute(AttributeType::String, Computed, "`<user_pool_id>:<provider_name>`"),
                    "user_pool_id" => attribute(AttributeType::String, Required, "Id of the user pool"),
                    "provider_name" => attribute(AttributeType::String, Required, "Name of the provider"),
                    "provider_type" => attribute(AttributeType::String, Required, "Type of the provider"),
                    "provider_details" => attribute(string_map_type(), Required, "Provider specific settings"),
                    "attribute_mapping" => attribute(
                        string_map_type(),
                        OptionalComputed,
                        "Mapping of user pool attributes to provider attributes",
                    ),
                    "idp_identifiers" => attribute(
                        AttributeType::List(Box::new(AttributeType::String)),
                        Optional,
                        "Identifiers of the provider",
                    ),
                },
                ..Default::default()
            },
        }
    }
}

impl<'a> WithNormalize for IdentityProviderState<'a> {
    fn normalize(&mut self, _diags: &mut Diagnostics) {
        unknown_if_null(&mut self.id);
        unknown_if_null(&mut self.attribute_mapping);
    }
}

#[async_trait]
impl<'a> WithValidate for IdentityProviderState<'a> {
    async fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        check_length(
            diags,
            attr_path.clone().attribute("provider_name"),
            &self.provider_name,
            1,
            32,
        );
        check_one_of(
            diags,
            attr_path.clone().attribute("provider_type"),
            &self.provider_type,
            PROVIDER_TYPES,
        );
        if let Value::Value(identifiers) = &self.idp_identifiers {
            if identifiers.len() > 50 {
                diags.error_short(
                    "At most 50 identifiers are allowed",
                    attr_path.clone().attribute("idp_identifiers"),
                );
            }
            for (i, identifier) in identifiers.iter().enumerate() {
                check_length(
                    diags,
                    attr_path
                        .clone()
                        .attribute("idp_identifiers")
                        .index(i as i64),
                    identifier,
                    1,
                    40,
                );
            }
        }
    }
}
