// Copyright 2025 Stoolap Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
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

//! Short-circuiting AND / OR over fallible operands
//!
//! Operands are evaluated left to right. AND stops at the first FALSE and
//! OR at the first TRUE, so an error in a later operand is only raised if
//! the result is still undecided when that operand is reached.

use crate::core::{Result, TriBool};

/// AND of lazily evaluated operands
pub fn and_all<I>(operands: I) -> Result<TriBool>
where
    I: IntoIterator<Item = Result<TriBool>>,
{
    let mut acc = TriBool::True;
    for operand in operands {
        acc = acc.and(operand?);
        if acc.is_false() {
            break;
        }
    }
    Ok(acc)
}

/// OR of lazily evaluated operands
pub fn or_any<I>(operands: I) -> Result<TriBool>
where
    I: IntoIterator<Item = Result<TriBool>>,
{
    let mut acc = TriBool::False;
    for operand in operands {
        acc = acc.or(operand?);
        if acc.is_true() {
            break;
        }
    }
    Ok(acc)
}
