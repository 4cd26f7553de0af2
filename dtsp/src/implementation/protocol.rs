// Copyright 2020 Xavier Gillard
//
// Permission is hereby granted, free of charge, to any person obtaining a copy of
// this software and associated documentation files (the "Software"), to deal in
// the Software without restriction, including without limitation the rights to
// use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of
// the Software, and to permit persons to whom the Software is furnished to do so,
// subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS
// FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR
// COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER
// IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN
// CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! This module defines the messages exchanged by the coordinator and its
//! workers along with the codec turning them into text frames.
//!
//! Every frame is a JSON object `{"name": <name>, "payload": <payload>}`.
//! Both directions share some names (`init`, `problem`, `solution`, `split`
//! and `start`) but the payloads differ with the direction, hence the two
//! enumerations.

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{Cost, PartialProblem, Result, Solution};

/// The messages a coordinator sends to its workers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name", content = "payload", rename_all = "lowercase")]
pub enum ToWorker {
    /// Provisions the worker with the flattened weight matrix of the network
    /// (-1 means no edge) and the name of the start vertex
    Init { graph: Vec<isize>, start: usize },
    /// Assigns a partial problem to the worker
    Problem { problem: PartialProblem },
    /// Broadcasts an improvement of the global solution
    Solution(Solution),
    /// Asks the worker to donate an unexplored branch at the given depth
    Split { depth: usize },
    /// Tells the worker the resolution has started
    Start,
}

/// The messages a worker sends to its coordinator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name", content = "payload", rename_all = "lowercase")]
pub enum ToCoordinator {
    /// Acknowledges the provisioning. `optimal_depth` is the split depth the
    /// worker recommends for the network it received
    Init {
        done: bool,
        #[serde(rename = "optimalDepth")]
        optimal_depth: usize,
    },
    /// Requests more work: the worker has nothing left to explore
    Problem,
    /// Reports a locally improving tour
    Solution(Solution),
    /// Answers a split request; `None` when nothing could be donated
    Split { problem: Option<PartialProblem> },
    /// Acknowledges the start of the resolution
    Start(bool),
}

impl ToWorker {
    /// Shorthand to broadcast a solution
    pub fn solution(path: Vec<usize>, cost: Cost) -> Self {
        ToWorker::Solution(Solution { path, cost })
    }
}

/// Encodes a message as a text frame
pub fn encode<M: Serialize>(message: &M) -> Result<String> {
    Ok(serde_json::to_string(message)?)
}
/// Decodes a text frame. It fails with `Error::Codec` when the frame does
/// not hold a message of the expected direction.
pub fn decode<M: DeserializeOwned>(frame: &str) -> Result<M> {
    Ok(serde_json::from_str(frame)?)
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################

#[cfg(test)]
mod test_protocol {
    use serde_json::{json, Value};

    use crate::*;

    fn as_json<M: serde::Serialize>(m: &M) -> Value {
        serde_json::from_str(&encode(m).unwrap()).unwrap()
    }

    #[test]
    fn init_carries_the_graph_and_start() {
        let m = ToWorker::Init { graph: vec![-1, 3, 3, -1], start: 1 };
        assert_eq!(json!({"name": "init", "payload": {"graph": [-1, 3, 3, -1], "start": 1}}), as_json(&m));
    }
    #[test]
    fn init_ack_uses_camel_case_depth() {
        let m = ToCoordinator::Init { done: true, optimal_depth: 2 };
        assert_eq!(json!({"name": "init", "payload": {"done": true, "optimalDepth": 2}}), as_json(&m));
    }
    #[test]
    fn problem_messages() {
        let m = ToWorker::Problem { problem: vec![1, 5] };
        assert_eq!(json!({"name": "problem", "payload": {"problem": [1, 5]}}), as_json(&m));
        assert_eq!(json!({"name": "problem"}), as_json(&ToCoordinator::Problem));
    }
    #[test]
    fn solution_payload_is_path_and_cost() {
        let m = ToWorker::solution(vec![1, 4, 2, 5, 3], 911);
        assert_eq!(json!({"name": "solution", "payload": {"path": [1, 4, 2, 5, 3], "cost": 911}}), as_json(&m));
    }
    #[test]
    fn split_answer_may_be_null() {
        let m = ToCoordinator::Split { problem: None };
        assert_eq!(json!({"name": "split", "payload": {"problem": null}}), as_json(&m));
        let m = ToWorker::Split { depth: 3 };
        assert_eq!(json!({"name": "split", "payload": {"depth": 3}}), as_json(&m));
    }
    #[test]
    fn start_messages() {
        assert_eq!(json!({"name": "start"}), as_json(&ToWorker::Start));
        assert_eq!(json!({"name": "start", "payload": true}), as_json(&ToCoordinator::Start(true)));
    }
    #[test]
    fn frames_are_decoded_by_name() {
        let m: ToCoordinator = decode(r#"{"name":"split","payload":{"problem":[1,3]}}"#).unwrap();
        assert_eq!(ToCoordinator::Split { problem: Some(vec![1, 3]) }, m);
        let m: ToWorker = decode(r#"{"name":"start"}"#).unwrap();
        assert_eq!(ToWorker::Start, m);
    }
    #[test]
    fn unknown_names_are_codec_errors() {
        let m = decode::<ToWorker>(r#"{"name":"halt","payload":{}}"#);
        assert!(matches!(m, Err(Error::Codec(_))));
    }
    #[test]
    fn garbage_is_a_codec_error() {
        assert!(matches!(decode::<ToCoordinator>("not json"), Err(Error::Codec(_))));
    }
}
