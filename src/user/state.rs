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

use serde::{Deserialize, Serialize};
use tf_provider::schema::{AttributeConstraint, AttributeType};
use tf_provider::value::{Value, ValueString};
use tf_provider::map;
use tf_provider::schema::{Block, Description, Schema};

use crate::attributes::AttributeSet;
use crate::utils::{
    attribute, known_map, sensitive_attribute, string_map_type, string_set_type, StringMap,
    StringSet, WithSchema,
};

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    #[serde(borrow = "'a")]
    pub user_pool_id: ValueString<'a>,
    #[serde(borrow = "'a")]
    pub username: ValueString<'a>,
    #[serde(borrow = "'a")]
    pub attributes: StringMap<'a>,
    pub enabled: Value<bool>,
    #[serde(borrow = "'a")]
    pub temporary_password: ValueString<'a>,
    #[serde(borrow = "'a")]
    pub password: ValueString<'a>,
    #[serde(borrow = "'a")]
    pub message_action: ValueString<'a>,
    #[serde(borrow = "'a")]
    pub desired_delivery_mediums: StringSet<'a>,
    pub force_alias_creation: Value<bool>,
    #[serde(borrow = "'a")]
    pub client_metadata: StringMap<'a>,
    #[serde(borrow = "'a")]
    pub sub: ValueString<'a>,
    #[serde(borrow = "'a")]
    pub status: ValueString<'a>,
    #[serde(borrow = "'a")]
    pub creation_date: ValueString<'a>,
    #[serde(borrow = "'a")]
    pub last_modified_date: ValueString<'a>,
    #[serde(borrow = "'a")]
    pub preferred_mfa_setting: ValueString<'a>,
    #[serde(borrow = "'a")]
    pub mfa_setting_list: StringSet<'a>,
}

impl<'a> UserState<'a> {
    /// Configured attributes, keyed by normalized name.
    pub(super) fn attribute_set(&self) -> AttributeSet {
        known_map(&self.attributes)
            .unwrap_or_default()
            .into_iter()
            .collect()
    }
}

impl<'a> WithSchema for UserState<'a> {
    fn schema() -> Schema {
        use AttributeConstraint::{Computed, Optional, Required};
        Schema {
            version: 1,
            block: Block {
                description: Description::plain("Cognito user pool user"),
                attributes: map! {
                    "id" => attribute(AttributeType::String, Computed, "`<user_pool_id>/<username>`"),
                    "user_pool_id" => attribute(AttributeType::String, Required, "Id of the user pool"),
                    "username" => attribute(AttributeType::String, Required, "Name of the user"),
                    "attributes" => attribute(
                        string_map_type(),
                        Optional,
                        "User attributes; custom attributes are given without their `custom:` prefix",
                    ),
                    "enabled" => attribute(AttributeType::Bool, Optional, "Whether the user may sign in (default true)"),
                    "temporary_password" => sensitive_attribute(
                        AttributeType::String,
                        Optional,
                        "Password the user must change at first sign-in",
                    ),
                    "password" => sensitive_attribute(AttributeType::String, Optional, "Permanent password"),
                    "message_action" => attribute(AttributeType::String, Optional, "`RESEND` or `SUPPRESS` the welcome message"),
                    "desired_delivery_mediums" => attribute(string_set_type(), Optional, "`SMS` and/or `EMAIL`"),
                    "force_alias_creation" => attribute(AttributeType::Bool, Optional, "Migrate an alias already used by another user"),
                    "client_metadata" => attribute(string_map_type(), Optional, "Metadata passed to the pool triggers"),
                    "sub" => attribute(AttributeType::String, Computed, "Immutable identifier of the user"),
                    "status" => attribute(AttributeType::String, Computed, "Confirmation status"),
                    "creation_date" => attribute(AttributeType::String, Computed, "Creation date"),
                    "last_modified_date" => attribute(AttributeType::String, Computed, "Last modification date"),
                    "preferred_mfa_setting" => attribute(AttributeType::String, Computed, "Preferred MFA method"),
                    "mfa_setting_list" => attribute(string_set_type(), Computed, "Enabled MFA methods"),
                },
                ..Default::default()
            },
        }
    }
}
