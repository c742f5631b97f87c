// Copyright (c) 2026 Spring83
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Property tests for the two round-trip laws that quantify over all
//! inputs: `parse(format(t)) == t` and `toEpochSeconds(fromEpochSeconds(u))
//! == u`.

use proptest::prelude::*;
use spring83::core::Timestamp;

proptest! {
    #[test]
    fn epoch_seconds_round_trip(secs in 0u64..=253_402_300_799u64) {
        let t = Timestamp::from_epoch_seconds(secs);
        prop_assert_eq!(t.to_epoch_seconds(), secs);
    }

    #[test]
    fn parse_format_round_trip(secs in 0u64..=253_402_300_799u64) {
        let t = Timestamp::from_epoch_seconds(secs);
        let formatted = t.to_canonical_string();
        let reparsed = Timestamp::parse(&formatted).unwrap();
        prop_assert_eq!(reparsed, t);
    }
}
