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

//! Conversion between JSON and the service's untyped documents.

use std::collections::HashMap;

use aws_smithy_types::{Document, Number};
use serde_json::Value as Json;

pub fn to_document(json: Json) -> Document {
    match json {
        Json::Null => Document::Null,
        Json::Bool(b) => Document::Bool(b),
        Json::Number(n) => Document::Number(if let Some(u) = n.as_u64() {
            Number::PosInt(u)
        } else if let Some(i) = n.as_i64() {
            Number::NegInt(i)
        } else {
            Number::Float(n.as_f64().unwrap_or_default())
        }),
        Json::String(s) => Document::String(s),
        Json::Array(items) => Document::Array(items.into_iter().map(to_document).collect()),
        Json::Object(fields) => Document::Object(
            fields
                .into_iter()
                .map(|(k, v)| (k, to_document(v)))
                .collect::<HashMap<_, _>>(),
        ),
    }
}

/// Non-finite floats have no JSON representation and become `null`.
pub fn from_document(document: &Document) -> Json {
    match document {
        Document::Null => Json::Null,
        Document::Bool(b) => Json::Bool(*b),
        Document::Number(Number::PosInt(u)) => Json::from(*u),
        Document::Number(Number::NegInt(i)) => Json::from(*i),
        Document::Number(Number::Float(f)) => {
            serde_json::Number::from_f64(*f).map_or(Json::Null, Json::Number)
        }
        Document::String(s) => Json::String(s.clone()),
        Document::Array(items) => Json::Array(items.iter().map(from_document).collect()),
        Document::Object(fields) => Json::Object(
            fields
                .iter()
                .map(|(k, v)| (k.clone(), from_document(v)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn numbers_keep_their_kind() {
        assert_eq!(to_document(json!(12)), Document::Number(Number::PosInt(12)));
        assert_eq!(to_document(json!(-3)), Document::Number(Number::NegInt(-3)));
        assert_eq!(to_document(json!(0.5)), Document::Number(Number::Float(0.5)));

        assert_eq!(from_document(&Document::Number(Number::PosInt(12))), json!(12));
        assert_eq!(from_document(&Document::Number(Number::Float(0.5))), json!(0.5));
        assert!(from_document(&Document::Number(Number::Float(f64::NAN))).is_null());
    }

    #[test]
    fn branding_settings_survive_conversion() {
        let settings = json!({
            "components": {
                "primaryButton": {
                    "lightMode": {"defaults": {"backgroundColor": "0972d3ff"}}
                },
                "form": {"borderRadius": 8.0, "logo": {"enabled": false}}
            },
            "categories": {"global": {"colorSchemeMode": "LIGHT", "spacingDensity": "REGULAR"}},
            "optional": null,
            "list": [1, "two", true]
        });

        assert_eq!(from_document(&to_document(settings.clone())), settings);
    }
}
