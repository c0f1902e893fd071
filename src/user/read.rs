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

use std::collections::{BTreeMap, HashMap};

use aws_smithy_types::date_time::Format;
use tf_provider::value::Value;

use crate::attributes::{AttributeKey, AttributeSet, StandardAttribute};
use crate::connection::{CognitoError, Connected, Result};
use crate::utils::{known_map, known_str, owned_map, owned_set, owned_string, StringMap};

use super::state::UserState;

impl<'a> UserState<'a> {
    /// Refresh the computed attributes from the service.
    ///
    /// Returns `false` when the user does not exist anymore.
    pub(super) async fn read(&mut self, connected: &Connected) -> Result<bool> {
        let user_pool_id = known_str(&self.user_pool_id).unwrap_or_default();
        let username = known_str(&self.username).unwrap_or_default();

        tracing::debug!(user_pool_id, username, "AdminGetUser");
        let output = match connected
            .client
            .admin_get_user()
            .user_pool_id(user_pool_id)
            .username(username)
            .send()
            .await
        {
            Ok(output) => output,
            Err(err) => {
                let err = CognitoError::from(err);
                if err.is_not_found() {
                    return Ok(false);
                }
                return Err(err);
            }
        };

        let remote: AttributeSet = output
            .user_attributes()
            .iter()
            .filter_map(|attr| Some((attr.name(), attr.value()?)))
            .collect();
        let configured = known_map(&self.attributes).unwrap_or_default();

        self.attributes = present_attributes(&remote, &configured, self.attributes.is_null());
        self.sub = owned_string(remote.get(&StandardAttribute::Sub.into()));
        self.enabled = Value::Value(output.enabled());
        self.status = owned_string(output.user_status().map(|status| status.as_str()));
        self.creation_date = owned_string(
            output
                .user_create_date()
                .and_then(|date| date.fmt(Format::DateTime).ok())
                .as_deref(),
        );
        self.last_modified_date = owned_string(
            output
                .user_last_modified_date()
                .and_then(|date| date.fmt(Format::DateTime).ok())
                .as_deref(),
        );
        self.preferred_mfa_setting = owned_string(output.preferred_mfa_setting());
        self.mfa_setting_list = owned_set(output.user_mfa_setting_list());

        Ok(true)
    }
}

/// Attributes as shown in configuration.
///
/// Configured keys keep the spelling used in configuration and immutable ones
/// echo the configured value. Other keys drop their `custom:` marker unless
/// that would make them read as a standard attribute. Null stays null when
/// nothing was set.
fn present_attributes<'a>(
    remote: &AttributeSet,
    configured: &HashMap<String, String>,
    configured_null: bool,
) -> StringMap<'a> {
    let spelling: BTreeMap<AttributeKey, &str> = configured
        .keys()
        .map(|raw| (AttributeKey::parse(raw), raw.as_str()))
        .collect();

    let mut shown: Vec<(String, &str)> = remote
        .iter()
        .filter(|(key, _)| !key.is_immutable())
        .map(|(key, value)| (presented_name(key, &spelling), value.as_str()))
        .collect();
    shown.extend(
        configured
            .iter()
            .filter(|(raw, _)| AttributeKey::parse(raw).is_immutable())
            .map(|(raw, value)| (raw.clone(), value.as_str())),
    );

    if shown.is_empty() && configured_null {
        Value::Null
    } else {
        owned_map(shown)
    }
}

fn presented_name(key: &AttributeKey, spelling: &BTreeMap<AttributeKey, &str>) -> String {
    if let Some(raw) = spelling.get(key) {
        return (*raw).to_owned();
    }
    let caller = key.caller_name();
    if AttributeKey::parse(caller) == *key {
        caller.to_owned()
    } else {
        key.wire_name().into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(pairs: &[(&str, &str)]) -> AttributeSet {
        pairs.iter().copied().collect()
    }

    fn config(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    fn shown(remote: &AttributeSet, configured: &[(&str, &str)]) -> HashMap<String, String> {
        known_map(&present_attributes(remote, &config(configured), false)).unwrap_or_default()
    }

    #[test]
    fn sub_hidden_unless_configured() {
        let remote = set(&[("sub", "abc"), ("email", "a@x.com"), ("custom:team", "red")]);

        let attributes = shown(&remote, &[("email", "a@x.com")]);
        assert_eq!(attributes.len(), 2);
        assert_eq!(attributes.get("team").map(String::as_str), Some("red"));
        assert!(!attributes.contains_key("sub"));
    }

    #[test]
    fn configured_sub_is_echoed() {
        let remote = set(&[("sub", "abc"), ("email", "a@x.com")]);

        let attributes = shown(&remote, &[("sub", "mine"), ("email", "a@x.com")]);
        assert_eq!(attributes.get("sub").map(String::as_str), Some("mine"));
        assert_eq!(attributes.len(), 2);
    }

    #[test]
    fn configured_spelling_is_kept() {
        let remote = set(&[("sub", "abc"), ("custom:team", "red"), ("custom:level", "3")]);

        let attributes = shown(&remote, &[("custom:team", "red")]);
        let mut keys: Vec<_> = attributes.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, ["custom:team", "level"]);
    }

    #[test]
    fn custom_shadowing_standard_keeps_marker() {
        let remote = set(&[("email", "a@x.com"), ("custom:email", "b@x.com")]);

        let attributes = shown(&remote, &[]);
        assert_eq!(attributes.get("email").map(String::as_str), Some("a@x.com"));
        assert_eq!(attributes.get("custom:email").map(String::as_str), Some("b@x.com"));
    }

    #[test]
    fn unconfigured_attributes_stay_null() {
        let remote = set(&[("sub", "abc")]);
        assert!(present_attributes(&remote, &HashMap::new(), true).is_null());
        assert!(!present_attributes(&remote, &HashMap::new(), false).is_null());
    }
}
