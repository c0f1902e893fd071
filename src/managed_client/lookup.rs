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

use aws_sdk_cognitoidentityprovider::types::UserPoolClientDescription;
use regex::Regex;

use crate::connection::{CognitoError, Connected, Result};

/// How the client to adopt is recognized among the clients of the pool.
#[derive(Debug, Clone)]
pub enum NameFilter {
    Prefix(String),
    Pattern(Regex),
}

impl NameFilter {
    pub fn new(prefix: Option<&str>, pattern: Option<&str>) -> Result<Self> {
        match (prefix, pattern) {
            (Some(prefix), None) => Ok(Self::Prefix(prefix.to_owned())),
            (None, Some(pattern)) => Regex::new(pattern)
                .map(Self::Pattern)
                .map_err(|err| CognitoError::Other(format!("invalid name pattern: {err}"))),
            _ => Err(CognitoError::Other(
                "exactly one of `name_prefix` or `name_pattern` must be known".to_owned(),
            )),
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        match self {
            Self::Prefix(prefix) => name.starts_with(prefix.as_str()),
            Self::Pattern(pattern) => pattern.is_match(name),
        }
    }
}

impl std::fmt::Display for NameFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Prefix(prefix) => write!(f, "prefix `{prefix}`"),
            Self::Pattern(pattern) => write!(f, "pattern `{pattern}`"),
        }
    }
}

/// Pick the single `(client_id, client_name)` matching `filter`.
pub fn select_single<'c>(
    clients: impl IntoIterator<Item = (&'c str, &'c str)>,
    filter: &NameFilter,
) -> Result<&'c str> {
    let mut matching = clients
        .into_iter()
        .filter(|(_, name)| filter.matches(name))
        .map(|(id, _)| id);

    match (matching.next(), matching.next()) {
        (Some(id), None) => Ok(id),
        (None, _) => Err(CognitoError::Other(format!(
            "no app client matches the {filter}"
        ))),
        (Some(_), Some(_)) => Err(CognitoError::Other(format!(
            "{} app clients match the {filter}, expected exactly one",
            2 + matching.count()
        ))),
    }
}

/// Id of the only client of `user_pool_id` whose name matches `filter`.
pub async fn find_client_id(
    connected: &Connected,
    user_pool_id: &str,
    filter: &NameFilter,
) -> Result<String> {
    tracing::debug!(user_pool_id, "ListUserPoolClients");
    let clients: Vec<UserPoolClientDescription> = connected
        .client
        .list_user_pool_clients()
        .user_pool_id(user_pool_id)
        .max_results(60)
        .into_paginator()
        .items()
        .send()
        .try_collect()
        .await?;

    let id = select_single(
        clients.iter().filter_map(|client| {
            Some((client.client_id()?, client.client_name().unwrap_or_default()))
        }),
        filter,
    )?;
    tracing::info!(user_pool_id, client_id = id, %filter, "adopting app client");
    Ok(id.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLIENTS: &[(&str, &str)] = &[
        ("1a", "AmazonOpenSearchService-domain-a"),
        ("2b", "AmazonOpenSearchService-domain-b"),
        ("3c", "web"),
    ];

    fn filter(prefix: Option<&str>, pattern: Option<&str>) -> NameFilter {
        NameFilter::new(prefix, pattern).unwrap()
    }

    #[test]
    fn prefix_must_select_one_client() {
        let unique = filter(Some("AmazonOpenSearchService-domain-a"), None);
        assert_eq!(select_single(CLIENTS.iter().copied(), &unique).ok(), Some("1a"));

        let ambiguous = filter(Some("AmazonOpenSearchService-"), None);
        let err = select_single(CLIENTS.iter().copied(), &ambiguous).unwrap_err();
        assert!(err.to_string().starts_with("2 app clients match"));

        let missing = filter(Some("mobile"), None);
        assert!(select_single(CLIENTS.iter().copied(), &missing).is_err());
    }

    #[test]
    fn pattern_matches_whole_names_when_anchored() {
        let pattern = filter(None, Some("^AmazonOpenSearchService-.*-b$"));
        assert_eq!(select_single(CLIENTS.iter().copied(), &pattern).ok(), Some("2b"));

        let loose = filter(None, Some("domain"));
        assert!(select_single(CLIENTS.iter().copied(), &loose).is_err());
    }

    #[test]
    fn filter_needs_exactly_one_criterion() {
        assert!(NameFilter::new(None, None).is_err());
        assert!(NameFilter::new(Some("a"), Some("b")).is_err());
        assert!(NameFilter::new(None, Some("(")).is_err());
    }
}
