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

use crate::connection::{CognitoError, Result};

use super::reconcile::ReconciliationPlan;

/// The two attribute primitives exposed by the service.
#[async_trait]
pub trait UserAttributeApi: Send + Sync {
    /// Set the given wire-level attributes
    async fn update_user_attributes(
        &self,
        user_pool_id: &str,
        username: &str,
        attributes: Vec<(String, String)>,
    ) -> Result<()>;

    /// Remove the given wire-level attributes
    async fn delete_user_attributes(
        &self,
        user_pool_id: &str,
        username: &str,
        names: Vec<String>,
    ) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Nothing had to be sent.
    Unchanged,
    Applied,
    /// The user does not exist anymore.
    Gone,
}

/// Send `plan` to the service: upserts first, then deletions.
pub async fn apply_plan<A>(
    api: &A,
    user_pool_id: &str,
    username: &str,
    plan: &ReconciliationPlan,
) -> Result<ApplyOutcome>
where
    A: UserAttributeApi + ?Sized,
{
    if plan.is_empty() {
        return Ok(ApplyOutcome::Unchanged);
    }

    let mut upserted = false;
    if !plan.upserts.is_empty() {
        match api
            .update_user_attributes(user_pool_id, username, plan.upserts.wire_pairs().collect())
            .await
        {
            Ok(()) => upserted = true,
            Err(err) if err.is_not_found() => return Ok(ApplyOutcome::Gone),
            Err(err) => return Err(err),
        }
    }

    if !plan.deletions.is_empty() {
        match api
            .delete_user_attributes(user_pool_id, username, plan.deletion_wire_names().collect())
            .await
        {
            Ok(()) => (),
            Err(err) if err.is_not_found() => return Ok(ApplyOutcome::Gone),
            Err(err) if upserted => return Err(CognitoError::PartialApply(Box::new(err))),
            Err(err) => return Err(err),
        }
    }

    Ok(ApplyOutcome::Applied)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::attributes::{reconcile, AttributeSet};

    #[derive(Debug, PartialEq, Eq)]
    enum Call {
        Update(Vec<(String, String)>),
        Delete(Vec<String>),
    }

    #[derive(Default)]
    struct FakeApi {
        calls: Mutex<Vec<Call>>,
        update_error: Option<&'static str>,
        delete_error: Option<&'static str>,
    }

    impl FakeApi {
        fn calls(&self) -> Vec<Call> {
            std::mem::take(&mut *self.calls.lock().unwrap())
        }
    }

    #[async_trait]
    impl UserAttributeApi for FakeApi {
        async fn update_user_attributes(
            &self,
            _user_pool_id: &str,
            _username: &str,
            attributes: Vec<(String, String)>,
        ) -> Result<()> {
            self.calls.lock().unwrap().push(Call::Update(attributes));
            match self.update_error {
                Some(code) => Err(CognitoError::classify(Some(code), "update failed")),
                None => Ok(()),
            }
        }

        async fn delete_user_attributes(
            &self,
            _user_pool_id: &str,
            _username: &str,
            names: Vec<String>,
        ) -> Result<()> {
            self.calls.lock().unwrap().push(Call::Delete(names));
            match self.delete_error {
                Some(code) => Err(CognitoError::classify(Some(code), "delete failed")),
                None => Ok(()),
            }
        }
    }

    fn set(pairs: &[(&str, &str)]) -> AttributeSet {
        pairs.iter().copied().collect()
    }

    #[tokio::test]
    async fn empty_plan_sends_nothing() {
        let api = FakeApi::default();
        let old = set(&[("email", "a@x.com")]);

        let outcome = apply_plan(&api, "pool", "alice", &reconcile(&old, &old)).await;

        assert_eq!(outcome.ok(), Some(ApplyOutcome::Unchanged));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn upserts_then_deletions_with_wire_names() {
        let api = FakeApi::default();
        let old = set(&[("email", "a@x.com"), ("custom:team", "red")]);
        let new = set(&[("email", "b@x.com"), ("favorite_color", "green")]);

        let outcome = apply_plan(&api, "pool", "alice", &reconcile(&old, &new)).await;

        assert_eq!(outcome.ok(), Some(ApplyOutcome::Applied));
        assert_eq!(
            api.calls(),
            vec![
                Call::Update(vec![
                    ("email".to_owned(), "b@x.com".to_owned()),
                    ("custom:favorite_color".to_owned(), "green".to_owned()),
                ]),
                Call::Delete(vec!["custom:team".to_owned()]),
            ]
        );
    }

    #[tokio::test]
    async fn only_deletions_skip_update_call() {
        let api = FakeApi::default();
        let old = set(&[("custom:color", "red")]);

        let outcome = apply_plan(&api, "pool", "alice", &reconcile(&old, &set(&[]))).await;

        assert_eq!(outcome.ok(), Some(ApplyOutcome::Applied));
        assert_eq!(api.calls(), vec![Call::Delete(vec!["custom:color".to_owned()])]);
    }

    #[tokio::test]
    async fn not_found_means_gone() {
        let api = FakeApi {
            update_error: Some("UserNotFoundException"),
            ..Default::default()
        };
        let plan = reconcile(&set(&[("custom:a", "1")]), &set(&[("email", "x")]));

        let outcome = apply_plan(&api, "pool", "alice", &plan).await;

        assert_eq!(outcome.ok(), Some(ApplyOutcome::Gone));
        assert_eq!(api.calls().len(), 1);
    }

    #[tokio::test]
    async fn failed_deletion_after_upsert_is_partial() {
        let api = FakeApi {
            delete_error: Some("InvalidParameterException"),
            ..Default::default()
        };
        let plan = reconcile(&set(&[("custom:a", "1")]), &set(&[("email", "x")]));

        let outcome = apply_plan(&api, "pool", "alice", &plan).await;

        assert!(matches!(outcome, Err(CognitoError::PartialApply(_))));
    }

    #[tokio::test]
    async fn validation_failure_is_surfaced() {
        let api = FakeApi {
            update_error: Some("InvalidParameterException"),
            ..Default::default()
        };
        let plan = reconcile(&set(&[]), &set(&[("email", "not an email")]));

        let outcome = apply_plan(&api, "pool", "alice", &plan).await;

        assert!(matches!(outcome, Err(CognitoError::Validation { .. })));
    }
}
