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

use std::borrow::Cow;
use std::fmt::Display;

/// Wire marker carried by every non-standard user attribute.
pub const CUSTOM_PREFIX: &str = "custom:";

/// Attributes of the built-in user pool schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StandardAttribute {
    Address,
    Birthdate,
    Email,
    EmailVerified,
    FamilyName,
    Gender,
    GivenName,
    Locale,
    MiddleName,
    Name,
    PhoneNumber,
    PhoneNumberVerified,
    Picture,
    PreferredUsername,
    Profile,
    Sub,
    UpdatedAt,
    Website,
    Zoneinfo,
}

impl StandardAttribute {
    pub const ALL: [StandardAttribute; 19] = [
        Self::Address,
        Self::Birthdate,
        Self::Email,
        Self::EmailVerified,
        Self::FamilyName,
        Self::Gender,
        Self::GivenName,
        Self::Locale,
        Self::MiddleName,
        Self::Name,
        Self::PhoneNumber,
        Self::PhoneNumberVerified,
        Self::Picture,
        Self::PreferredUsername,
        Self::Profile,
        Self::Sub,
        Self::UpdatedAt,
        Self::Website,
        Self::Zoneinfo,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Address => "address",
            Self::Birthdate => "birthdate",
            Self::Email => "email",
            Self::EmailVerified => "email_verified",
            Self::FamilyName => "family_name",
            Self::Gender => "gender",
            Self::GivenName => "given_name",
            Self::Locale => "locale",
            Self::MiddleName => "middle_name",
            Self::Name => "name",
            Self::PhoneNumber => "phone_number",
            Self::PhoneNumberVerified => "phone_number_verified",
            Self::Picture => "picture",
            Self::PreferredUsername => "preferred_username",
            Self::Profile => "profile",
            Self::Sub => "sub",
            Self::UpdatedAt => "updated_at",
            Self::Website => "website",
            Self::Zoneinfo => "zoneinfo",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|attr| attr.name() == name)
    }

    /// The service rejects any update or removal of these attributes.
    pub fn is_immutable(self) -> bool {
        matches!(self, Self::Sub)
    }
}

/// Name of a user attribute, independent of its wire representation.
///
/// Custom attributes are stored without their `custom:` marker: the marker is
/// added by [`AttributeKey::wire_name`] and never shown to configuration.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AttributeKey {
    Standard(StandardAttribute),
    Custom(String),
}

impl AttributeKey {
    /// Parse a key coming either from configuration or from the service.
    ///
    /// An explicit `custom:` marker always wins. Without it, the name is looked
    /// up in the standard schema and falls back to a custom attribute.
    pub fn parse(raw: &str) -> Self {
        if let Some(name) = raw.strip_prefix(CUSTOM_PREFIX) {
            return Self::Custom(name.to_owned());
        }
        match StandardAttribute::from_name(raw) {
            Some(standard) => Self::Standard(standard),
            None => Self::Custom(raw.to_owned()),
        }
    }

    /// Name expected by the admin attribute calls.
    pub fn wire_name(&self) -> Cow<'_, str> {
        match self {
            Self::Standard(standard) => Cow::Borrowed(standard.name()),
            Self::Custom(name) => Cow::Owned(format!("{CUSTOM_PREFIX}{name}")),
        }
    }

    /// Name presented back to configuration.
    pub fn caller_name(&self) -> &str {
        match self {
            Self::Standard(standard) => standard.name(),
            Self::Custom(name) => name,
        }
    }

    pub fn is_immutable(&self) -> bool {
        matches!(self, Self::Standard(standard) if standard.is_immutable())
    }
}

impl From<StandardAttribute> for AttributeKey {
    fn from(value: StandardAttribute) -> Self {
        Self::Standard(value)
    }
}

impl Display for AttributeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.wire_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_names_are_bijective() {
        for attr in StandardAttribute::ALL {
            assert_eq!(StandardAttribute::from_name(attr.name()), Some(attr));
        }
    }

    #[test]
    fn custom_key_round_trip() {
        let key = AttributeKey::parse("favorite_color");
        assert_eq!(key.wire_name(), "custom:favorite_color");

        let key = AttributeKey::parse("custom:favorite_color");
        assert_eq!(key.caller_name(), "favorite_color");
        assert_eq!(key, AttributeKey::Custom("favorite_color".to_owned()));
    }

    #[test]
    fn standard_key_never_prefixed() {
        let key = AttributeKey::parse("email_verified");
        assert_eq!(key, AttributeKey::Standard(StandardAttribute::EmailVerified));
        assert_eq!(key.wire_name(), "email_verified");
        assert_eq!(key.caller_name(), "email_verified");
    }

    #[test]
    fn explicit_marker_wins_over_standard_lookup() {
        let key = AttributeKey::parse("custom:email");
        assert_eq!(key, AttributeKey::Custom("email".to_owned()));
        assert_eq!(key.wire_name(), "custom:email");
    }

    #[test]
    fn only_sub_is_immutable() {
        let immutable: Vec<_> = StandardAttribute::ALL
            .into_iter()
            .filter(|attr| attr.is_immutable())
            .collect();
        assert_eq!(immutable, vec![StandardAttribute::Sub]);
        assert!(!AttributeKey::parse("custom:sub").is_immutable());
    }
}
