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
use aws_sdk_cognitoidentityprovider::types::ResourceServerScopeType;

use tf_provider::value::{Value, ValueEmpty};
use tf_provider::{schema::Schema, AttributePath, Diagnostics, Resource};

use crate::connection::{retry_on_conflict, CognitoConnection, CognitoError, Connected, Result};
use crate::utils::{known_str, owned_string, split_id, WithNormalize, WithSchema, WithValidate};

use super::state::{ResourceServerState, ScopeState};

#[derive(Debug, Default, Clone)]
pub struct ResourceServerResource {
    connection: CognitoConnection,
}

impl ResourceServerResource {
    pub fn new(connection: CognitoConnection) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl Resource for ResourceServerResource {
    type State<'a> = ResourceServerState<'a>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(ResourceServerState::schema())
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
                    "resource server not found, removing from state"
                );
                diags.root_warning(
                    "Resource server not found",
                    format!(
                        "The resource server `{}` does not exist anymore and has been removed from the state.",
                        state.id.as_str()
                    ),
                );
                None
            }
            Err(err) => {
                diags.root_error("Failed to read resource server", err.to_string());
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
        if let (Some(pool), Some(identifier)) =
            (known_str(&state.user_pool_id), known_str(&state.identifier))
        {
            state.id = owned_string(Some(&format!("{pool}|{identifier}")));
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
        if prior_state.identifier != proposed_state.identifier {
            trigger_replace.push(AttributePath::new("identifier"));
        }

        let mut state = proposed_state;
        state.normalize(diags);
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

        if let Err(err) = create_resource_server(&connected, &state).await {
            diags.root_error("Failed to create resource server", err.to_string());
            return None;
        }
        tracing::info!(id = state.id.as_str(), "resource server created");

        match state.read(&connected).await {
            Ok(true) => Some((state, private_state)),
            Ok(false) => {
                diags.root_error(
                    "Failed to read created resource server",
                    "The resource server disappeared right after its creation.",
                );
                None
            }
            Err(err) => {
                diags.root_error("Failed to read created resource server", err.to_string());
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

        if prior_state.name != state.name || prior_state.scopes() != state.scopes() {
            if let Err(err) = update_resource_server(&connected, &state).await {
                diags.root_error("Failed to update resource server", err.to_string());
                return None;
            }
        }

        match state.read(&connected).await {
            Ok(true) => Some((state, private_state)),
            Ok(false) => {
                diags.root_error(
                    "Failed to read updated resource server",
                    "The resource server disappeared during its update.",
                );
                None
            }
            Err(err) => {
                diags.root_error("Failed to read updated resource server", err.to_string());
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
        let identifier = known_str(&state.identifier).unwrap_or_default();

        tracing::debug!(user_pool_id, identifier, "DeleteResourceServer");
        let result = connected
            .client
            .delete_resource_server()
            .user_pool_id(user_pool_id)
            .identifier(identifier)
            .send()
            .await
            .map_err(CognitoError::from);

        match result {
            Ok(_) => {
                tracing::info!(user_pool_id, identifier, "resource server deleted");
                Some(())
            }
            Err(err) if err.is_not_found() => Some(()),
            Err(err) => {
                diags.root_error("Failed to delete resource server", err.to_string());
                None
            }
        }
    }

    async fn import<'a>(
        &self,
        diags: &mut Diagnostics,
        id: String,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let Some([user_pool_id, identifier]) = split_id::<2>(&id, '|') else {
            diags.root_error(
                "Invalid import id",
                format!("Expected `<user_pool_id>|<identifier>`, got `{id}`."),
            );
            return None;
        };

        let state = ResourceServerState {
            id: owned_string(Some(&id)),
            user_pool_id: owned_string(Some(user_pool_id)),
            identifier: owned_string(Some(identifier)),
            ..Default::default()
        };
        Some((state, Default::default()))
    }
}

impl<'a> ResourceServerState<'a> {
    async fn read(&mut self, connected: &Connected) -> Result<bool> {
        let user_pool_id = known_str(&self.user_pool_id).unwrap_or_default();
        let identifier = known_str(&self.identifier).unwrap_or_default();

        tracing::debug!(user_pool_id, identifier, "DescribeResourceServer");
        let output = match connected
            .client
            .describe_resource_server()
            .user_pool_id(user_pool_id)
            .identifier(identifier)
            .send()
            .await
            .map_err(CognitoError::from)
        {
            Ok(output) => output,
            Err(err) if err.is_not_found() => return Ok(false),
            Err(err) => return Err(err),
        };
        let Some(server) = output.resource_server() else {
            return Ok(false);
        };

        if self.id.is_null() || self.id.is_unknown() {
            self.id = owned_string(Some(&format!("{user_pool_id}|{identifier}")));
        }
        self.name = owned_string(server.name());
        self.scope = if server.scopes().is_empty() && self.scope.is_null() {
            Value::Null
        } else {
            Value::Value(
                server
                    .scopes()
                    .iter()
                    .map(|scope| {
                        Value::Value(ScopeState {
                            scope_name: owned_string(Some(scope.scope_name())),
                            scope_description: owned_string(Some(scope.scope_description())),
                        })
                    })
                    .collect(),
            )
        };
        self.scope_identifiers = self.compute_scope_identifiers();

        Ok(true)
    }
}

fn scope_types(state: &ResourceServerState<'_>) -> Result<Vec<ResourceServerScopeType>> {
    state
        .scopes()
        .into_iter()
        .map(|(name, description)| {
            ResourceServerScopeType::builder()
                .scope_name(name)
                .scope_description(description)
                .build()
                .map_err(CognitoError::from)
        })
        .collect()
}

async fn create_resource_server(connected: &Connected, state: &ResourceServerState<'_>) -> Result<()> {
    let user_pool_id = known_str(&state.user_pool_id).unwrap_or_default();
    let identifier = known_str(&state.identifier).unwrap_or_default();
    let scopes = scope_types(state)?;

    tracing::debug!(user_pool_id, identifier, scopes = scopes.len(), "CreateResourceServer");
    connected
        .client
        .create_resource_server()
        .user_pool_id(user_pool_id)
        .identifier(identifier)
        .name(known_str(&state.name).unwrap_or_default())
        .set_scopes((!scopes.is_empty()).then_some(scopes))
        .send()
        .await?;
    Ok(())
}

/// The service replaces the whole scope list, so it is always sent in full.
async fn update_resource_server(connected: &Connected, state: &ResourceServerState<'_>) -> Result<()> {
    let user_pool_id = known_str(&state.user_pool_id).unwrap_or_default();
    let identifier = known_str(&state.identifier).unwrap_or_default();
    let name = known_str(&state.name).unwrap_or_default();
    let scopes = &scope_types(state)?;

    tracing::debug!(user_pool_id, identifier, scopes = scopes.len(), "UpdateResourceServer");
    let client = &connected.client;
    retry_on_conflict(connected.retry, "UpdateResourceServer", move || async move {
        client
            .update_resource_server()
            .user_pool_id(user_pool_id)
            .identifier(identifier)
            .name(name)
            .set_scopes(Some(scopes.clone()))
            .send()
            .await?;
        Ok(())
    })
    .await
}
