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

use tf_provider::value::ValueEmpty;
use tf_provider::{schema::Schema, AttributePath, Diagnostics, Resource};

use crate::connection::{CognitoConnection, CognitoError, Connected, Result};
use crate::utils::{known_str, owned_string, split_id, WithNormalize, WithSchema, WithValidate};

use super::lookup::{find_client_id, NameFilter};
use super::settings::{describe_client, update_client};
use super::state::ManagedClientState;

#[derive(Debug, Default, Clone)]
pub struct ManagedUserPoolClientResource {
    connection: CognitoConnection,
}

impl ManagedUserPoolClientResource {
    pub fn new(connection: CognitoConnection) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl Resource for ManagedUserPoolClientResource {
    type State<'a> = ManagedClientState<'a>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(ManagedClientState::schema())
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
                    "app client not found, removing from state"
                );
                diags.root_warning(
                    "App client not found",
                    format!(
                        "The app client `{}` does not exist anymore and has been removed from the state.",
                        state.id.as_str()
                    ),
                );
                None
            }
            Err(err) => {
                diags.root_error("Failed to read app client", err.to_string());
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
        Some((proposed_state, prior_private_state, trigger_replace))
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

        match adopt(&connected, &planned_state).await {
            Ok(state) => Some((state, private_state)),
            Err(err) => {
                diags.root_error("Failed to adopt app client", err.to_string());
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

        match update_client(&connected, &state).await {
            Ok(Some(client)) => {
                state.load_remote(&client);
                Some((state, private_state))
            }
            Ok(None) => {
                diags.root_error(
                    "Failed to update app client",
                    "The service did not return the updated client.",
                );
                None
            }
            Err(err) => {
                diags.root_error("Failed to update app client", err.to_string());
                None
            }
        }
    }

    async fn destroy<'a>(
        &self,
        _diags: &mut Diagnostics,
        state: Self::State<'a>,
        _planned_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<()> {
        tracing::info!(
            id = state.id.as_str(),
            "app client is owned by another service, leaving it in place"
        );
        Some(())
    }

    async fn import<'a>(
        &self,
        diags: &mut Diagnostics,
        id: String,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let Some([user_pool_id, client_id]) = split_id::<2>(&id, '/') else {
            diags.root_error(
                "Invalid import id",
                format!("Expected `<user_pool_id>/<client_id>`, got `{id}`."),
            );
            return None;
        };

        let state = ManagedClientState {
            id: owned_string(Some(client_id)),
            user_pool_id: owned_string(Some(user_pool_id)),
            ..Default::default()
        };
        Some((state, Default::default()))
    }
}

impl<'a> ManagedClientState<'a> {
    async fn read(&mut self, connected: &Connected) -> Result<bool> {
        let user_pool_id = known_str(&self.user_pool_id).unwrap_or_default();
        let client_id = known_str(&self.id).unwrap_or_default();

        match describe_client(connected, user_pool_id, client_id).await? {
            Some(client) => {
                self.load_remote(&client);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Find the client matching the plan, then bring its settings in line.
async fn adopt<'a>(
    connected: &Connected,
    plan: &ManagedClientState<'a>,
) -> Result<ManagedClientState<'a>> {
    let user_pool_id = known_str(&plan.user_pool_id).unwrap_or_default();
    let filter = NameFilter::new(known_str(&plan.name_prefix), known_str(&plan.name_pattern))?;
    let client_id = find_client_id(connected, user_pool_id, &filter).await?;

    let mut state = plan.clone();
    state.id = owned_string(Some(&client_id));
    if !state.read(connected).await? {
        return Err(CognitoError::Other(format!(
            "app client `{client_id}` disappeared while being adopted"
        )));
    }

    if state.merge_planned(plan) {
        tracing::debug!(user_pool_id, %client_id, "adopted client differs from the plan");
        if let Some(client) = update_client(connected, &state).await? {
            state.load_remote(&client);
        }
    }
    Ok(state)
}
