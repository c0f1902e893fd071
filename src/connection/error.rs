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

use aws_sdk_cognitoidentityprovider::error::{BuildError, ProvideErrorMetadata, SdkError};
use aws_smithy_types::error::display::DisplayErrorContext;
use thiserror::Error;

pub type Result<T, E = CognitoError> = std::result::Result<T, E>;

/// Failure of a call to the Cognito Identity Provider API.
#[derive(Debug, Error)]
pub enum CognitoError {
    #[error("the provider has not been configured yet")]
    NotConfigured,

    /// The targeted entity does not exist anymore.
    #[error("{code}: {message}")]
    NotFound { code: String, message: String },

    /// Another writer modified the entity concurrently.
    #[error("{code}: {message}")]
    Conflict { code: String, message: String },

    /// The request was rejected as malformed; never retried.
    #[error("{code}: {message}")]
    Validation { code: String, message: String },

    #[error("{code}: {message}")]
    Throttled { code: String, message: String },

    #[error("invalid request: {0}")]
    Build(#[from] BuildError),

    #[error("attributes were updated but removing the others failed: {0}")]
    PartialApply(#[source] Box<CognitoError>),

    #[error("{0}")]
    Other(String),
}

const NOT_FOUND_CODES: &[&str] = &["ResourceNotFoundException", "UserNotFoundException"];
const CONFLICT_CODES: &[&str] = &["ConcurrentModificationException"];
const THROTTLED_CODES: &[&str] = &["TooManyRequestsException", "LimitExceededException"];
const VALIDATION_CODES: &[&str] = &[
    "InvalidParameterException",
    "InvalidPasswordException",
    "InvalidOAuthFlowException",
    "AliasExistsException",
    "UsernameExistsException",
    "DuplicateProviderException",
    "UnsupportedIdentityProviderException",
    "ScopeDoesNotExistException",
    "ManagedLoginBrandingExistsException",
];

impl CognitoError {
    /// Map a service error code onto the error taxonomy.
    pub fn classify(code: Option<&str>, message: impl Into<String>) -> Self {
        let message = message.into();
        let Some(code) = code else {
            return Self::Other(message);
        };
        let code_owned = code.to_owned();
        if NOT_FOUND_CODES.contains(&code) {
            Self::NotFound {
                code: code_owned,
                message,
            }
        } else if CONFLICT_CODES.contains(&code) {
            Self::Conflict {
                code: code_owned,
                message,
            }
        } else if THROTTLED_CODES.contains(&code) {
            Self::Throttled {
                code: code_owned,
                message,
            }
        } else if VALIDATION_CODES.contains(&code) {
            Self::Validation {
                code: code_owned,
                message,
            }
        } else {
            Self::Other(format!("{code}: {message}"))
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

impl<E, R> From<SdkError<E, R>> for CognitoError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug + Send + Sync + 'static,
{
    fn from(err: SdkError<E, R>) -> Self {
        match err.as_service_error() {
            Some(service) => {
                let message = service
                    .message()
                    .map(str::to_owned)
                    .unwrap_or_else(|| DisplayErrorContext(service).to_string());
                Self::classify(service.code(), message)
            }
            None => Self::Other(DisplayErrorContext(&err).to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_codes() {
        assert!(CognitoError::classify(Some("UserNotFoundException"), "gone").is_not_found());
        assert!(CognitoError::classify(Some("ResourceNotFoundException"), "gone").is_not_found());
        assert!(
            CognitoError::classify(Some("ConcurrentModificationException"), "busy").is_conflict()
        );
        assert!(matches!(
            CognitoError::classify(Some("InvalidParameterException"), "bad key"),
            CognitoError::Validation { .. }
        ));
        assert!(matches!(
            CognitoError::classify(Some("TooManyRequestsException"), "slow down"),
            CognitoError::Throttled { .. }
        ));
    }

    #[test]
    fn unknown_code_keeps_message_verbatim() {
        let err = CognitoError::classify(Some("InternalErrorException"), "boom");
        assert_eq!(err.to_string(), "InternalErrorException: boom");

        let err = CognitoError::classify(None, "dispatch failure");
        assert_eq!(err.to_string(), "dispatch failure");
    }

    #[test]
    fn validation_message_is_surfaced() {
        let err = CognitoError::classify(
            Some("InvalidParameterException"),
            "Attribute does not exist in the schema.",
        );
        assert_eq!(
            err.to_string(),
            "InvalidParameterException: Attribute does not exist in the schema."
        );
    }
}
