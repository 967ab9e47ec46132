//  Copyright 2024 MrCroxx
//
//  Licensed under the Apache License, Version 2.0 (the "License");
//  you may not use this file except in compliance with the License.
//  You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.

use crate::ByteView;

/// A value that can report how many bytes it costs to keep resident.
///
/// The LRU's storage weight for an entry is `key.len() + value.len()`.
pub trait Measurable {
    fn len(&self) -> usize;
}

impl Measurable for ByteView {
    fn len(&self) -> usize {
        ByteView::len(self)
    }
}

impl Measurable for Vec<u8> {
    fn len(&self) -> usize {
        Vec::len(self)
    }
}

impl Measurable for String {
    fn len(&self) -> usize {
        String::len(self)
    }
}
