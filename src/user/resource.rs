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
use aws_sdk_cognitoidentityprovider::types::{
    AttributeType, DeliveryMediumType, MessageActionType,
};

use tf_provider::value::{Value, ValueEmpty};
use tf_provider::{schema::Schema, AttributePath, Diagnostics, Resource};

use crate::attributes::{apply_plan, reconcile, ApplyOutcome, AttributeSet};
use crate::connection::{CognitoConnection, CognitoError, Connected, Result};
use crate::utils::{
    known_bool, known_map, known_str, known_strings, owned_string, split_id, WithNormalize,
    WithSchema, WithValidate,
};

use super::state::UserState;

#[derive(Debug, Default, Clone)]
pub struct UserResource {
    connection: CognitoConnection,
}

impl UserResource {
    pub fn new(connection: CognitoConnection) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl Resource for UserResource {
    type State<'a> = UserState<'a>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(UserState::schema())
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::State<'a>) -> Option<()> {
        config.validate(diags, Default::default()).await;

        if diags.errors.is_empty() {
            Some(())
        } else {
            None
        }
    }

    async fn read<'a>(
        &self,
        diags: &mut Diagnostics,
        state: Self::State<'a>,
        private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let connected = self.connection.connect(diags).await?;

        let mut state = state;
        match state.read(&connected).await {
            Ok(true) => Some((state, private_state)),
            Ok(false) => {
                tracing::warn!(id = state.id.as_str(), "user not found, removing from state");
                diags.root_warning(
                    "User not found",
                    format!(
                        "The user `{}` does not exist anymore and has been removed from the state.",
                        state.id.as_str()
                    ),
                );
                None
            }
            Err(err) => {
                diags.root_error("Failed to read user", err.to_string());
                None
            }
        }
    }

    async fn plan_create<'a>(
        &self,
        diags: &mut Diagnostics,
        proposed_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let mut state = proposed_state;
        state.normalize(diags);
        if let (Some(pool), Some(username)) =
            (known_str(&state.user_pool_id), known_str(&state.username))
        {
            state.id = owned_string(Some(&format!("{pool}/{username}")));
        }

        Some((state, Default::default()))
    }

    async fn plan_update<'a>(
        &self,
        diags: &mut Diagnostics,
        prior_state: Self::State<'a>,
        proposed_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        prior_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(
        Self::State<'a>,
        Self::PrivateState<'a>,
        Vec<tf_provider::AttributePath>,
    )> {
        let mut trigger_replace = Vec::new();
        if prior_state.user_pool_id != proposed_state.user_pool_id {
            trigger_replace.push(AttributePath::new("user_pool_id"));
        }
        if prior_state.username != proposed_state.username {
            trigger_replace.push(AttributePath::new("username"));
        }

        let mut state = proposed_state;
        state.normalize(diags);

        let attributes_changed = !reconcile(&prior_state.attribute_set(), &state.attribute_set())
            .is_empty()
            || state.attributes.is_unknown();
        let password_changed = prior_state.password != state.password
            || prior_state.temporary_password != state.temporary_password;

        if attributes_changed || password_changed || prior_state.enabled != state.enabled {
            state.last_modified_date = Value::Unknown;
        }
        if password_changed {
            state.status = Value::Unknown;
        }

        Some((state, prior_private_state, trigger_replace))
    }

    async fn plan_destroy<'a>(
        &self,
        _diags: &mut Diagnostics,
        _prior_state: Self::State<'a>,
        prior_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<Self::PrivateState<'a>> {
        Some(prior_private_state)
    }

    async fn create<'a>(
        &self,
        diags: &mut Diagnostics,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let connected = self.connection.connect(diags).await?;

        let mut state = planned_state;
        state.normalize(diags);

        if let Err(err) = create_user(&connected, &state).await {
            diags.root_error("Failed to create user", err.to_string());
            return None;
        }
        tracing::info!(id = state.id.as_str(), "user created");

        match state.read(&connected).await {
            Ok(true) => Some((state, private_state)),
            Ok(false) => {
                diags.root_error(
                    "Failed to read created user",
                    "The user disappeared right after its creation.",
                );
                None
            }
            Err(err) => {
                diags.root_error("Failed to read created user", err.to_string());
                None
            }
        }
    }

    async fn update<'a>(
        &self,
        diags: &mut Diagnostics,
        prior_state: Self::State<'a>,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let connected = self.connection.connect(diags).await?;

        let mut state = planned_state;
        let user_pool_id = known_str(&state.user_pool_id).unwrap_or_default().to_owned();
        let username = known_str(&state.username).unwrap_or_default().to_owned();

        let plan = reconcile(&prior_state.attribute_set(), &state.attribute_set());
        tracing::debug!(
            %user_pool_id,
            %username,
            upserts = plan.upserts.len(),
            deletions = plan.deletions.len(),
            "reconciled user attributes"
        );
        match apply_plan(&connected, &user_pool_id, &username, &plan).await {
            Ok(ApplyOutcome::Gone) => {
                diags.error_short(
                    "The user has been deleted outside of Terraform",
                    AttributePath::new("username"),
                );
                return None;
            }
            Ok(ApplyOutcome::Applied | ApplyOutcome::Unchanged) => (),
            Err(err) => {
                diags.error(
                    "Failed to update user attributes",
                    err.to_string(),
                    AttributePath::new("attributes"),
                );
                return None;
            }
        }

        if prior_state.enabled != state.enabled {
            if let Err(err) =
                set_enabled(&connected, &user_pool_id, &username, known_bool(&state.enabled)).await
            {
                diags.error(
                    "Failed to change user status",
                    err.to_string(),
                    AttributePath::new("enabled"),
                );
                return None;
            }
        }

        for (attr, permanent, prior, planned) in [
            ("password", true, &prior_state.password, &state.password),
            (
                "temporary_password",
                false,
                &prior_state.temporary_password,
                &state.temporary_password,
            ),
        ] {
            let Some(password) = known_str(planned).filter(|_| prior != planned) else {
                continue;
            };
            if let Err(err) =
                set_password(&connected, &user_pool_id, &username, password, permanent).await
            {
                diags.error("Failed to set password", err.to_string(), AttributePath::new(attr));
                return None;
            }
        }

        match state.read(&connected).await {
            Ok(true) => Some((state, private_state)),
            Ok(false) => {
                diags.root_error(
                    "Failed to read updated user",
                    "The user disappeared during its update.",
                );
                None
            }
            Err(err) => {
                diags.root_error("Failed to read updated user", err.to_string());
                None
            }
        }
    }

    async fn destroy<'a>(
        &self,
        diags: &mut Diagnostics,
        state: Self::State<'a>,
        _planned_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<()> {
        let connected = self.connection.connect(diags).await?;
        let user_pool_id = known_str(&state.user_pool_id).unwrap_or_default();
        let username = known_str(&state.username).unwrap_or_default();

        tracing::debug!(user_pool_id, username, "AdminDeleteUser");
        let result = connected
            .client
            .admin_delete_user()
            .user_pool_id(user_pool_id)
            .username(username)
            .send()
            .await
            .map_err(CognitoError::from);

        match result {
            Ok(_) => {
                tracing::info!(user_pool_id, username, "user deleted");
                Some(())
            }
            Err(err) if err.is_not_found() => Some(()),
            Err(err) => {
                diags.root_error("Failed to delete user", err.to_string());
                None
            }
        }
    }

    async fn import<'a>(
        &self,
        diags: &mut Diagnostics,
        id: String,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let Some([user_pool_id, username]) = split_id::<2>(&id, '/') else {
            diags.root_error(
                "Invalid import id",
                format!("Expected `<user_pool_id>/<username>`, got `{id}`."),
            );
            return None;
        };

        let state = UserState {
            id: owned_string(Some(&id)),
            user_pool_id: owned_string(Some(user_pool_id)),
            username: owned_string(Some(username)),
            enabled: Value::Value(true),
            ..Default::default()
        };
        Some((state, Default::default()))
    }
}

async fn create_user(connected: &Connected, state: &UserState<'_>) -> Result<()> {
    let user_pool_id = known_str(&state.user_pool_id).unwrap_or_default();
    let username = known_str(&state.username).unwrap_or_default();

    let attributes = reconcile(&AttributeSet::new(), &state.attribute_set())
        .upserts
        .wire_pairs()
        .map(|(name, value)| AttributeType::builder().name(name).value(value).build())
        .collect::<std::result::Result<Vec<_>, _>>()?;

    tracing::debug!(user_pool_id, username, "AdminCreateUser");
    connected
        .client
        .admin_create_user()
        .user_pool_id(user_pool_id)
        .username(username)
        .set_user_attributes((!attributes.is_empty()).then_some(attributes))
        .set_temporary_password(known_str(&state.temporary_password).map(str::to_owned))
        .set_message_action(known_str(&state.message_action).map(MessageActionType::from))
        .set_desired_delivery_mediums(known_strings(&state.desired_delivery_mediums).map(
            |mediums| {
                mediums
                    .iter()
                    .map(|medium| DeliveryMediumType::from(medium.as_str()))
                    .collect()
            },
        ))
        .set_force_alias_creation(known_bool(&state.force_alias_creation))
        .set_client_metadata(known_map(&state.client_metadata))
        .send()
        .await?;

    if known_bool(&state.enabled) == Some(false) {
        set_enabled(connected, user_pool_id, username, Some(false)).await?;
    }
    if let Some(password) = known_str(&state.password) {
        set_password(connected, user_pool_id, username, password, true).await?;
    }
    Ok(())
}

async fn set_enabled(
    connected: &Connected,
    user_pool_id: &str,
    username: &str,
    enabled: Option<bool>,
) -> Result<()> {
    if enabled.unwrap_or(true) {
        tracing::debug!(user_pool_id, username, "AdminEnableUser");
        connected
            .client
            .admin_enable_user()
            .user_pool_id(user_pool_id)
            .username(username)
            .send()
            .await?;
    } else {
        tracing::debug!(user_pool_id, username, "AdminDisableUser");
        connected
            .client
            .admin_disable_user()
            .user_pool_id(user_pool_id)
            .username(username)
            .send()
            .await?;
    }
    Ok(())
}

async fn set_password(
    connected: &Connected,
    user_pool_id: &str,
    username: &str,
    password: &str,
    permanent: bool,
) -> Result<()> {
    tracing::debug!(user_pool_id, username, permanent, "AdminSetUserPassword");
    connected
        .client
        .admin_set_user_password()
        .user_pool_id(user_pool_id)
        .username(username)
        .password(password)
        .permanent(permanent)
        .send()
        .await?;
    Ok(())
}
