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
use aws_smithy_types::Document;

use tf_provider::value::{Value, ValueEmpty};
use tf_provider::{schema::Schema, AttributePath, Diagnostics, Resource};

use crate::connection::{retry_on_conflict, CognitoConnection, CognitoError, Connected, Result};
use crate::utils::{
    known_bool, known_str, owned_string, split_id, WithNormalize, WithSchema, WithValidate,
};

use super::document::{from_document, to_document};
use super::state::LoginBrandingState;

#[derive(Debug, Default, Clone)]
pub struct ManagedLoginBrandingResource {
    connection: CognitoConnection,
}

impl ManagedLoginBrandingResource {
    pub fn new(connection: CognitoConnection) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl Resource for ManagedLoginBrandingResource {
    type State<'a> = LoginBrandingState<'a>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(LoginBrandingState::schema())
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
                tracing::warn!(
                    id = state.id.as_str(),
                    "managed login branding not found, removing from state"
                );
                diags.root_warning(
                    "Managed login branding not found",
                    format!(
                        "The managed login branding `{}` does not exist anymore and has been removed from the state.",
                        state.id.as_str()
                    ),
                );
                None
            }
            Err(err) => {
                diags.root_error("Failed to read managed login branding", err.to_string());
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
        Some((state, Default::default()))
    }

    async fn plan_update<'a>(
        &self,
        _diags: &mut Diagnostics,
        prior_state: Self::State<'a>,
        proposed_state: Self::State<'a>,
        config_state: Self::State<'a>,
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
        // An imported branding does not know its client yet.
        if !prior_state.client_id.is_null() && prior_state.client_id != proposed_state.client_id {
            trigger_replace.push(AttributePath::new("client_id"));
        }

        let mut state = proposed_state;
        let settings_changed = prior_state.settings != state.settings;
        if settings_changed && config_state.use_cognito_provided_values.is_null() {
            state.use_cognito_provided_values = Value::Unknown;
        }
        if settings_changed
            || prior_state.use_cognito_provided_values != state.use_cognito_provided_values
        {
            state.settings_all = Value::Unknown;
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

        let branding_id = match create_branding(&connected, &state).await {
            Ok(branding_id) => branding_id,
            Err(err) => {
                diags.root_error("Failed to create managed login branding", err.to_string());
                return None;
            }
        };
        let user_pool_id = known_str(&state.user_pool_id).unwrap_or_default();
        state.id = owned_string(Some(&format!("{user_pool_id},{branding_id}")));
        state.managed_login_branding_id = owned_string(Some(&branding_id));
        tracing::info!(id = state.id.as_str(), "managed login branding created");

        match state.read(&connected).await {
            Ok(true) => Some((state, private_state)),
            Ok(false) => {
                diags.root_error(
                    "Failed to read created managed login branding",
                    "The managed login branding disappeared right after its creation.",
                );
                None
            }
            Err(err) => {
                diags.root_error("Failed to read created managed login branding", err.to_string());
                None
            }
        }
    }

    async fn update<'a>(
        &self,
        diags: &mut Diagnostics,
        _prior_state: Self::State<'a>,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let connected = self.connection.connect(diags).await?;
        let mut state = planned_state;

        if let Err(err) = update_branding(&connected, &state).await {
            diags.root_error("Failed to update managed login branding", err.to_string());
            return None;
        }

        match state.read(&connected).await {
            Ok(true) => Some((state, private_state)),
            Ok(false) => {
                diags.root_error(
                    "Failed to read updated managed login branding",
                    "The managed login branding disappeared during its update.",
                );
                None
            }
            Err(err) => {
                diags.root_error("Failed to read updated managed login branding", err.to_string());
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
        let branding_id = known_str(&state.managed_login_branding_id).unwrap_or_default();

        tracing::debug!(user_pool_id, branding_id, "DeleteManagedLoginBranding");
        let result = connected
            .client
            .delete_managed_login_branding()
            .user_pool_id(user_pool_id)
            .managed_login_branding_id(branding_id)
            .send()
            .await
            .map_err(CognitoError::from);

        match result {
            Ok(_) => {
                tracing::info!(user_pool_id, branding_id, "managed login branding deleted");
                Some(())
            }
            Err(err) if err.is_not_found() => Some(()),
            Err(err) => {
                diags.root_error("Failed to delete managed login branding", err.to_string());
                None
            }
        }
    }

    async fn import<'a>(
        &self,
        diags: &mut Diagnostics,
        id: String,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let Some([user_pool_id, branding_id]) = split_id::<2>(&id, ',') else {
            diags.root_error(
                "Invalid import id",
                format!("Expected `<user_pool_id>,<managed_login_branding_id>`, got `{id}`."),
            );
            return None;
        };

        let state = LoginBrandingState {
            id: owned_string(Some(&id)),
            user_pool_id: owned_string(Some(user_pool_id)),
            managed_login_branding_id: owned_string(Some(branding_id)),
            ..Default::default()
        };
        Some((state, Default::default()))
    }
}

impl<'a> LoginBrandingState<'a> {
    async fn read(&mut self, connected: &Connected) -> Result<bool> {
        let user_pool_id = known_str(&self.user_pool_id).unwrap_or_default().to_owned();
        let branding_id = known_str(&self.managed_login_branding_id)
            .unwrap_or_default()
            .to_owned();

        let (own, merged) = futures::try_join!(
            describe_branding(connected, &user_pool_id, &branding_id, false),
            describe_branding(connected, &user_pool_id, &branding_id, true),
        )?;
        let (Some((use_defaults, own)), Some((_, merged))) = (own, merged) else {
            return Ok(false);
        };

        if self.id.is_null() || self.id.is_unknown() {
            self.id = owned_string(Some(&format!("{user_pool_id},{branding_id}")));
        }
        self.use_cognito_provided_values = Value::Value(use_defaults);
        let configured = self.settings_json().and_then(serde_json::Result::ok);
        self.settings = match own {
            // Keep the configured text when it means the same thing.
            Some(remote) if configured.as_ref() == Some(&remote) => self.settings.clone(),
            Some(_) if use_defaults && self.settings.is_null() => Value::Null,
            Some(remote) => owned_string(Some(&remote.to_string())),
            None => Value::Null,
        };
        self.settings_all = owned_string(merged.map(|merged| merged.to_string()).as_deref());

        Ok(true)
    }

    fn settings_document(&self) -> Result<Option<Document>> {
        match self.settings_json() {
            Some(Ok(json)) => Ok(Some(to_document(json))),
            Some(Err(err)) => Err(CognitoError::Other(format!("invalid settings: {err}"))),
            None => Ok(None),
        }
    }

    /// Cognito defaults are used unless settings are given.
    fn use_cognito_defaults(&self, settings: &Option<Document>) -> bool {
        known_bool(&self.use_cognito_provided_values).unwrap_or(settings.is_none())
    }
}

/// `(use_cognito_provided_values, settings)` of a branding, `None` when it is gone.
async fn describe_branding(
    connected: &Connected,
    user_pool_id: &str,
    branding_id: &str,
    merged: bool,
) -> Result<Option<(bool, Option<serde_json::Value>)>> {
    tracing::debug!(user_pool_id, branding_id, merged, "DescribeManagedLoginBranding");
    let output = match connected
        .client
        .describe_managed_login_branding()
        .user_pool_id(user_pool_id)
        .managed_login_branding_id(branding_id)
        .return_merged_resources(merged)
        .send()
        .await
        .map_err(CognitoError::from)
    {
        Ok(output) => output,
        Err(err) if err.is_not_found() => return Ok(None),
        Err(err) => return Err(err),
    };

    Ok(output.managed_login_branding().map(|branding| {
        (
            branding.use_cognito_provided_values(),
            branding.settings().map(from_document),
        )
    }))
}

async fn create_branding(connected: &Connected, state: &LoginBrandingState<'_>) -> Result<String> {
    let user_pool_id = known_str(&state.user_pool_id).unwrap_or_default();
    let client_id = known_str(&state.client_id).unwrap_or_default();
    let settings = state.settings_document()?;
    let use_defaults = state.use_cognito_defaults(&settings);

    tracing::debug!(user_pool_id, client_id, use_defaults, "CreateManagedLoginBranding");
    let output = connected
        .client
        .create_managed_login_branding()
        .user_pool_id(user_pool_id)
        .client_id(client_id)
        .use_cognito_provided_values(use_defaults)
        .set_settings(settings)
        .send()
        .await?;

    output
        .managed_login_branding()
        .and_then(|branding| branding.managed_login_branding_id())
        .map(str::to_owned)
        .ok_or_else(|| CognitoError::Other("the service returned no branding id".to_owned()))
}

async fn update_branding(connected: &Connected, state: &LoginBrandingState<'_>) -> Result<()> {
    let user_pool_id = known_str(&state.user_pool_id).unwrap_or_default();
    let branding_id = known_str(&state.managed_login_branding_id).unwrap_or_default();
    let settings = &state.settings_document()?;
    let use_defaults = state.use_cognito_defaults(settings);

    tracing::debug!(user_pool_id, branding_id, use_defaults, "UpdateManagedLoginBranding");
    let client = &connected.client;
    retry_on_conflict(connected.retry, "UpdateManagedLoginBranding", move || async move {
        client
            .update_managed_login_branding()
            .user_pool_id(user_pool_id)
            .managed_login_branding_id(branding_id)
            .use_cognito_provided_values(use_defaults)
            .set_settings(settings.clone())
            .send()
            .await?;
        Ok(())
    })
    .await
}
