//! Testing utilities for the pipeline.
//!
//! This module provides scripted stand-ins for the model interfaces:
//! - [`MockChat`] returns canned completions and records every call
//! - [`MockEmbedder`] embeds deterministically so exact (normalized)
//!   duplicates collide and everything else is orthogonal
//!
//! Both are used by the in-crate unit tests and the integration tests;
//! no test here talks to the network.

use crate::client::{ChatClient, Embedder};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// One recorded chat call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub prompt: String,
    pub temperature: f32,
}

struct MockChatState {
    responses: Vec<String>,
    next: usize,
    calls: Vec<RecordedCall>,
}

/// A chat client that replays scripted responses in order.
///
/// Once the script is exhausted the final response repeats, so
/// accumulation loops keep receiving (duplicate) output and terminate
/// through deduplication and the round cap rather than hanging. A mock
/// with an empty script fails the completion contract on first use.
pub struct MockChat {
    state: Mutex<MockChatState>,
}

impl MockChat {
    /// Create a mock with scripted responses.
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            state: Mutex::new(MockChatState {
                responses,
                next: 0,
                calls: Vec::new(),
            }),
        }
    }

    /// All calls made so far, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().expect("mock chat lock").calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().expect("mock chat lock").calls.len()
    }
}

#[async_trait]
impl ChatClient for MockChat {
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String> {
        let mut state = self.state.lock().expect("mock chat lock");
        state.calls.push(RecordedCall {
            prompt: prompt.to_string(),
            temperature,
        });

        let response = if state.next < state.responses.len() {
            let response = state.responses[state.next].clone();
            state.next += 1;
            response
        } else if let Some(last) = state.responses.last() {
            last.clone()
        } else {
            return Err(Error::Api(openai::Error::EmptyResponse));
        };
        Ok(response)
    }
}

struct MockEmbedderState {
    slots: HashMap<String, usize>,
    calls: usize,
}

/// Deterministic embedder: every distinct input text gets its own
/// one-hot vector, so identical texts have similarity 1.0 and distinct
/// texts 0.0.
pub struct MockEmbedder {
    state: Mutex<MockEmbedderState>,
}

/// Dimension of the mock vectors; far above what any test embeds.
const MOCK_DIM: usize = 512;

impl MockEmbedder {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockEmbedderState {
                slots: HashMap::new(),
                calls: 0,
            }),
        }
    }

    /// Number of embed calls made so far.
    pub fn embed_calls(&self) -> usize {
        self.state.lock().expect("mock embedder lock").calls
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut state = self.state.lock().expect("mock embedder lock");
        state.calls += 1;
        let vectors = texts
            .iter()
            .map(|text| {
                let next = state.slots.len();
                let slot = *state.slots.entry(text.clone()).or_insert(next);
                assert!(slot < MOCK_DIM, "mock embedder slot space exhausted");
                let mut vector = vec![0.0; MOCK_DIM];
                vector[slot] = 1.0;
                vector
            })
            .collect();
        Ok(vectors)
    }
}

/// Render items as the serial-numbered list the generation prompts ask
/// for: `1. first\n2. second\n...`.
pub fn numbered_list(items: &[&str]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {item}", i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}
