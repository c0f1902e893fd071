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

use tf_provider::value::Value;
use tf_provider::Diagnostics;

use crate::utils::{unknown_if_null, WithNormalize};

use super::state::UserState;

impl<'a> WithNormalize for UserState<'a> {
    fn normalize(&mut self, _diags: &mut Diagnostics) {
        if self.enabled.is_null() {
            self.enabled = Value::Value(true);
        }
        unknown_if_null(&mut self.id);
        unknown_if_null(&mut self.sub);
        unknown_if_null(&mut self.status);
        unknown_if_null(&mut self.creation_date);
        unknown_if_null(&mut self.last_modified_date);
        unknown_if_null(&mut self.preferred_mfa_setting);
        unknown_if_null(&mut self.mfa_setting_list);
    }
}
